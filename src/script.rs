pub mod loader;
pub mod substitute;

use crate::error::{Error, Result};
use log::debug;
use std::fmt;

/// Line separating the blocks of a script file.
pub const DELIMITER: &str = "---";

/// Keyword marking a command that prompts for the user's password.
pub const PRIVILEGED_KEYWORD: &str = "sudo";

const COMMENT_MARKER: char = '#';

/// One command line and the lines fed to it on stdin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script {
    pub command: String,
    pub stdin: Vec<String>,
}

impl Script {
    pub fn new(command: &str, stdin: &[&str]) -> Self {
        Script {
            command: command.to_string(),
            stdin: stdin.iter().map(|line| line.to_string()).collect(),
        }
    }
}

/// A parsed script file: its name and the scripts in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptFile {
    pub name: String,
    pub scripts: Vec<Script>,
}

impl ScriptFile {
    /// True if any command mentions `sudo`.
    ///
    /// This is a substring test on the command text, so `sudoku` counts too.
    pub fn requires_password(&self) -> bool {
        self.scripts
            .iter()
            .any(|script| script.command.contains(PRIVILEGED_KEYWORD))
    }

    /// True if any stdin line carries the password placeholder.
    pub fn uses_placeholder(&self) -> bool {
        self.scripts.iter().any(|script| {
            script
                .stdin
                .iter()
                .any(|line| line.contains(substitute::PASSWORD_PLACEHOLDER))
        })
    }
}

impl fmt::Display for ScriptFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Parses the text of one script file.
///
/// Blocks are separated by lines consisting of `---`. Within a block, blank
/// lines and lines starting with `#` are dropped; the first remaining line is
/// the command and the rest are its stdin lines.
pub fn parse(name: &str, content: &str) -> Result<ScriptFile> {
    let scripts = split_blocks(content)
        .into_iter()
        .map(|block| parse_block(name, &block))
        .collect::<Result<Vec<Script>>>()?;

    debug!("parsed {} script(s) from {}", scripts.len(), name);

    Ok(ScriptFile {
        name: name.to_string(),
        scripts,
    })
}

fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = vec![Vec::new()];
    for line in content.lines() {
        if line.trim() == DELIMITER {
            blocks.push(Vec::new());
        } else if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }
    blocks
}

fn parse_block(name: &str, lines: &[&str]) -> Result<Script> {
    let mut content = cleanup(lines).into_iter();
    let command = content.next().ok_or_else(|| Error::Parse {
        name: name.to_string(),
    })?;

    Ok(Script {
        command,
        stdin: content.collect(),
    })
}

fn cleanup(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FILE1: &str = "
sudo whoami
PASSWORD
";

    const FILE2: &str = "

herp derp
PASSWORD
foo
PASSWORD

";

    const FILE3: &str = "
echo alpha
---
sudo whoami
PASSWORD
---
echo beta
bar
PASSWORD
";

    const FILE4: &str = "
# comment1
echo alpha
---
# comment 2
sudo whoami
PASSWORD
#comment3
#comment4
PASSWORD
---
# comment 0
# comment 1
# comment 2

echo beta
# comment 3
bar
PASSWORD

# comment 4
";

    const FILE5: &str = "
whoami
";

    const FILE6: &str = "
echo alpha
---
whoami
---
echo beta
bar
whatup
";

    #[rstest]
    #[case(FILE1, vec![Script::new("sudo whoami", &["PASSWORD"])], true)]
    #[case(FILE2, vec![Script::new("herp derp", &["PASSWORD", "foo", "PASSWORD"])], false)]
    #[case(FILE3, vec![
        Script::new("echo alpha", &[]),
        Script::new("sudo whoami", &["PASSWORD"]),
        Script::new("echo beta", &["bar", "PASSWORD"]),
    ], true)]
    #[case(FILE4, vec![
        Script::new("echo alpha", &[]),
        Script::new("sudo whoami", &["PASSWORD", "PASSWORD"]),
        Script::new("echo beta", &["bar", "PASSWORD"]),
    ], true)]
    #[case(FILE5, vec![Script::new("whoami", &[])], false)]
    #[case(FILE6, vec![
        Script::new("echo alpha", &[]),
        Script::new("whoami", &[]),
        Script::new("echo beta", &["bar", "whatup"]),
    ], false)]
    fn test_parse_script_file(
        #[case] content: &str,
        #[case] expected: Vec<Script>,
        #[case] needs_password: bool,
    ) {
        let file = parse("testfile", content).unwrap();

        assert_eq!(file.name, "testfile");
        assert_eq!(file.scripts, expected);
        assert_eq!(file.requires_password(), needs_password);
    }

    #[test]
    fn test_comment_only_block_is_an_error() {
        let content = "echo alpha\n---\n# comment\n\n---\necho beta\n";
        let result = parse("broken", content);

        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "no command in script broken");
    }

    #[rstest]
    #[case("")]
    #[case("   \n\n")]
    #[case("# only a comment\n\n")]
    fn test_empty_file_is_an_error(#[case] content: &str) {
        assert!(matches!(
            parse("empty", content),
            Err(Error::Parse { name }) if name == "empty"
        ));
    }

    #[test]
    fn test_trailing_delimiter_leaves_an_empty_block() {
        assert!(parse("trailing", "whoami\n---\n").is_err());
    }

    #[test]
    fn test_lines_are_trimmed_but_inner_whitespace_kept() {
        let file = parse("spacing", "   echo   a  b   \n\t two  words \n").unwrap();

        assert_eq!(file.scripts, vec![Script::new("echo   a  b", &["two  words"])]);
    }

    #[test]
    fn test_indented_delimiter_still_splits() {
        let file = parse("indent", "whoami\n  ---  \nhostname\n").unwrap();

        assert_eq!(file.scripts.len(), 2);
    }

    #[test]
    fn test_commented_delimiter_does_not_split() {
        let file = parse("commented", "whoami\n# ---\nhostname\n").unwrap();

        assert_eq!(file.scripts, vec![Script::new("whoami", &["hostname"])]);
    }

    #[test]
    fn test_sudo_detection_is_a_substring_match() {
        let file = parse("games", "sudoku --solve\n").unwrap();

        assert!(file.requires_password());
    }

    #[test]
    fn test_sudo_in_stdin_does_not_require_password() {
        let file = parse("stdin", "cat\nsudo\n").unwrap();

        assert!(!file.requires_password());
    }

    #[test]
    fn test_uses_placeholder() {
        assert!(parse("a", FILE2).unwrap().uses_placeholder());
        assert!(!parse("b", FILE6).unwrap().uses_placeholder());
    }

    #[test]
    fn test_display_is_the_file_name() {
        let file = parse("10-install", FILE5).unwrap();

        assert_eq!(file.to_string(), "10-install");
    }
}
