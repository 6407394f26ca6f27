use crate::attempt::MessageVerdict;
use crate::endpoint::ResponseTransform;
use crate::message::Payload;
use rand::distr::Alphanumeric;
use rand::Rng;

pub const ECHO_GREETING: &str = "Hello, WebSocket Echo Server!";
pub const BINARY_SAMPLE: &[u8] = b"Binary test data \x00\x01\x02\x03";
pub const CHAT_MESSAGES: [&str; 3] = ["Hello!", "How are you?", "This is a test message"];
const REPEATED_MESSAGES: usize = 3;

/// What a single response must look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Exact(Payload),
    Transformed(ResponseTransform),
}

impl Predicate {
    pub fn expected(&self, sent: &Payload) -> Payload {
        match self {
            Predicate::Exact(expected) => expected.clone(),
            Predicate::Transformed(transform) => transform.apply(sent),
        }
    }

    // A frame of the wrong type is a predicate failure, never a fatal error
    pub fn evaluate(&self, sent: &Payload, received: &Payload) -> MessageVerdict {
        let expected = self.expected(sent);

        if expected.kind() != received.kind() {
            return MessageVerdict::UnexpectedFrameType {
                expected: expected.kind(),
                actual: received.kind(),
            };
        }

        if &expected == received {
            MessageVerdict::Matched
        } else {
            MessageVerdict::Mismatch {
                expected,
                actual: received.clone(),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Step {
    pub payload: Payload,
    pub predicate: Predicate,
}

/// An ordered list of messages, each one with the response it must produce.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            steps: Vec::new(),
        }
    }

    pub fn push(mut self, payload: Payload, predicate: Predicate) -> Self {
        self.steps.push(Step { payload, predicate });
        self
    }

    // Pure echo step, the response must be byte-identical
    pub fn push_echo(self, payload: Payload) -> Self {
        let predicate = Predicate::Exact(payload.clone());
        self.push(payload, predicate)
    }

    pub fn push_text(self, text: &str, transform: &ResponseTransform) -> Self {
        self.push(Payload::from(text), Predicate::Transformed(transform.clone()))
    }

    pub fn push_binary(self, data: Vec<u8>, transform: &ResponseTransform) -> Self {
        self.push(Payload::Binary(data), Predicate::Transformed(transform.clone()))
    }

    /// Greeting text, a binary blob with NUL bytes, then a few numbered messages,
    /// each expected back as `transform` of itself (`Identity` for a pure echo).
    pub fn echo_suite(transform: &ResponseTransform) -> Self {
        let mut scenario = Scenario::new("echo")
            .push_text(ECHO_GREETING, transform)
            .push_binary(BINARY_SAMPLE.to_vec(), transform);

        for i in 1..=REPEATED_MESSAGES {
            scenario = scenario.push_text(&format!("Message #{}", i), transform);
        }
        scenario
    }

    pub fn chat_suite(transform: &ResponseTransform) -> Self {
        CHAT_MESSAGES
            .iter()
            .fold(Scenario::new("chat"), |scenario, message| {
                scenario.push_text(message, transform)
            })
    }

    /// `count` text messages of roughly `size` random alphanumeric characters, each
    /// tagged with its index so that a stale response never matches a later message.
    pub fn burst(count: usize, size: usize, transform: &ResponseTransform) -> Self {
        (0..count).fold(Scenario::new("burst"), |scenario, i| {
            let text = format!("{}:{}", i, generate_random_string(size));
            scenario.push_text(&text, transform)
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn generate_random_string(size: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(size)
        .map(char::from)
        .collect()
}
