use crate::error::{Error, Result};
use regex::{Captures, Regex};
use zeroize::Zeroizing;

/// Placeholder in stdin lines replaced by the user's password.
pub const PASSWORD_PLACEHOLDER: &str = "PASSWORD";

/// Replaces every occurrence of every placeholder in every line.
///
/// Each line is scanned once, left to right, against all placeholders at
/// the same time: replacement values are never searched for placeholders
/// again. When placeholders overlap at one position the earlier table entry
/// wins.
pub fn substitute(stdin: &[String], substitutions: &[(&str, &str)]) -> Result<Vec<String>> {
    let keys: Vec<String> = substitutions
        .iter()
        .filter(|(placeholder, _)| !placeholder.is_empty())
        .map(|(placeholder, _)| regex::escape(placeholder))
        .collect();
    if keys.is_empty() {
        return Ok(stdin.to_vec());
    }

    let re = Regex::new(&keys.join("|"))
        .map_err(|e| Error::Config(format!("invalid placeholder table: {}", e)))?;

    Ok(stdin
        .iter()
        .map(|line| {
            re.replace_all(line, |caps: &Captures| {
                substitutions
                    .iter()
                    .find(|(placeholder, _)| *placeholder == &caps[0])
                    .map(|(_, value)| *value)
                    .unwrap_or_default()
            })
            .into_owned()
        })
        .collect())
}

/// Joins lines into the text written to a command's stdin, each line
/// followed by a newline.
pub fn combine(lines: &[String]) -> String {
    let mut text = String::with_capacity(lines.iter().map(|line| line.len() + 1).sum());
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    text
}

/// Builds the stdin payload for a script, with the password substituted.
pub fn stdin_payload(stdin: &[String], password: &str) -> Result<Zeroizing<String>> {
    let mut lines = substitute(stdin, &[(PASSWORD_PLACEHOLDER, password)])?;
    let payload = Zeroizing::new(combine(&lines));
    for line in lines.iter_mut() {
        zeroize::Zeroize::zeroize(line);
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_substitute_password() {
        let stdin = lines(&["PASSWORD", "foo", "PASSWORD"]);
        let replaced = substitute(&stdin, &[("PASSWORD", "secret123")]).unwrap();

        assert_eq!(replaced, lines(&["secret123", "foo", "secret123"]));
        assert_eq!(combine(&replaced), "secret123\nfoo\nsecret123\n");
    }

    #[test]
    fn test_substitute_multiple_occurrences_in_one_line() {
        let stdin = lines(&["PASSWORD:PASSWORD", "user=PASSWORDx"]);
        let replaced = substitute(&stdin, &[("PASSWORD", "pw")]).unwrap();

        assert_eq!(replaced, lines(&["pw:pw", "user=pwx"]));
        assert!(replaced.iter().all(|line| !line.contains("PASSWORD")));
    }

    #[test]
    fn test_substitute_is_not_recursive() {
        let stdin = lines(&["PASSWORD"]);
        let replaced = substitute(&stdin, &[("PASSWORD", "PASSWORDPASSWORD")]).unwrap();

        assert_eq!(replaced, lines(&["PASSWORDPASSWORD"]));
    }

    #[test]
    fn test_substitute_leaves_other_lines_alone() {
        let stdin = lines(&["  keep  spacing ", "password", "Password"]);
        let replaced = substitute(&stdin, &[("PASSWORD", "x")]).unwrap();

        assert_eq!(replaced, stdin);
    }

    #[test]
    fn test_combine_empty() {
        assert_eq!(combine(&[]), "");
    }

    #[test]
    fn test_stdin_payload() {
        let stdin = lines(&["PASSWORD", "y"]);
        let payload = stdin_payload(&stdin, " hunter2 ").unwrap();

        assert_eq!(payload.as_str(), " hunter2 \ny\n");
    }

    #[test]
    fn test_substitute_does_not_chain_table_entries() {
        let stdin = lines(&["A", "AB", "BA"]);
        let replaced = substitute(&stdin, &[("A", "B"), ("B", "C")]).unwrap();

        assert_eq!(replaced, lines(&["B", "BC", "CB"]));
    }

    #[test]
    fn test_substitute_overlapping_placeholders_prefer_earlier_entry() {
        let stdin = lines(&["PASSWORD2"]);
        let replaced = substitute(&stdin, &[("PASSWORD", "x"), ("PASSWORD2", "y")]).unwrap();

        assert_eq!(replaced, lines(&["x2"]));
    }

    #[test]
    fn test_substitute_value_is_taken_literally() {
        let stdin = lines(&["PASSWORD"]);
        let replaced = substitute(&stdin, &[("PASSWORD", "p$1${0}\\")]).unwrap();

        assert_eq!(replaced, lines(&["p$1${0}\\"]));
    }

    #[test]
    fn test_substitute_empty_table() {
        let stdin = lines(&["PASSWORD"]);

        assert_eq!(substitute(&stdin, &[]).unwrap(), stdin);
    }
}
