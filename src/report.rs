use colored::Colorize;

/// Placeholder printed for a command that produced no output.
pub const NO_OUTPUT: &str = "<no output>";

/// Receives the transcript of a run.
pub trait Reporter: Send {
    /// Start of the work for a host.
    fn banner(&mut self, host: &str);

    /// Label preceding a command's output.
    fn info(&mut self, text: &str);

    /// Highlighted notes, such as the no-output placeholder.
    fn emphasis(&mut self, text: &str);

    /// Captured command output.
    fn output(&mut self, text: &str);

    /// Separator between script files.
    fn blank(&mut self);
}

/// Writes the transcript to stdout in colour.
#[derive(Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn banner(&mut self, host: &str) {
        println!("{}", format!("--- {}", host).magenta());
    }

    fn info(&mut self, text: &str) {
        println!("{}", text.yellow());
    }

    fn emphasis(&mut self, text: &str) {
        println!("{}", text.magenta());
    }

    fn output(&mut self, text: &str) {
        println!("{}", text.blue());
    }

    fn blank(&mut self) {
        println!();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Banner(String),
    Info(String),
    Emphasis(String),
    Output(String),
    Blank,
}

/// Records transcript events so a host's output can be emitted in one piece.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    events: Vec<Event>,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript { events: Vec::new() }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Sends every recorded event to `reporter`, in order.
    pub fn replay(&self, reporter: &mut dyn Reporter) {
        for event in &self.events {
            match event {
                Event::Banner(host) => reporter.banner(host),
                Event::Info(text) => reporter.info(text),
                Event::Emphasis(text) => reporter.emphasis(text),
                Event::Output(text) => reporter.output(text),
                Event::Blank => reporter.blank(),
            }
        }
    }
}

impl Reporter for Transcript {
    fn banner(&mut self, host: &str) {
        self.events.push(Event::Banner(host.to_string()));
    }

    fn info(&mut self, text: &str) {
        self.events.push(Event::Info(text.to_string()));
    }

    fn emphasis(&mut self, text: &str) {
        self.events.push(Event::Emphasis(text.to_string()));
    }

    fn output(&mut self, text: &str) {
        self.events.push(Event::Output(text.to_string()));
    }

    fn blank(&mut self) {
        self.events.push(Event::Blank);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_replay_keeps_order() {
        let mut first = Transcript::new();
        first.banner("web1");
        first.info("executing command `whoami`");
        first.output("root");
        first.emphasis(NO_OUTPUT);
        first.blank();

        let mut second = Transcript::new();
        first.replay(&mut second);

        assert_eq!(first.events(), second.events());
        assert_eq!(second.events()[0], Event::Banner("web1".to_string()));
        assert_eq!(second.events()[4], Event::Blank);
    }
}
