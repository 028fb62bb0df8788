use crate::error::{Error, Result};
use regex::Regex;

/// Largest number of hosts a single range may expand to.
pub const MAX_RANGE_HOSTS: usize = 4096;

/// Expands a host expression into an ordered list of host names.
///
/// Items are separated by commas or whitespace. Each item may contain one
/// `[start:end(:stride)]` range, numeric or alphabetic. Duplicates are
/// dropped, keeping the first occurrence.
pub fn expand(expression: &str) -> Result<Vec<String>> {
    let re = Regex::new(r"\[([a-zA-Z0-9]+):([a-zA-Z0-9]+)(?::(\d+))?]")
        .map_err(|e| Error::HostPattern(e.to_string()))?;

    let mut hosts: Vec<String> = Vec::new();
    for item in expression
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
    {
        for host in expand_item(&re, item)? {
            if !hosts.contains(&host) {
                hosts.push(host);
            }
        }
    }

    if hosts.is_empty() {
        return Err(Error::HostPattern(format!(
            "'{}' does not name any hosts",
            expression
        )));
    }

    Ok(hosts)
}

fn expand_item(re: &Regex, pattern: &str) -> Result<Vec<String>> {
    let matches: Vec<_> = re.captures_iter(pattern).collect();
    let captures = match matches.as_slice() {
        [] => return Ok(vec![pattern.to_string()]),
        [captures] => captures,
        _ => {
            return Err(Error::HostPattern(format!(
                "multiple ranges not supported: {}",
                pattern
            )))
        }
    };

    let full_match = &captures[0];
    let start = &captures[1];
    let end = &captures[2];
    let stride = match captures.get(3) {
        Some(m) => m
            .as_str()
            .parse::<usize>()
            .map_err(|e| Error::HostPattern(format!("{}: {}", pattern, e)))?,
        None => 1,
    };
    if stride == 0 {
        return Err(Error::HostPattern(format!("zero stride in {}", pattern)));
    }

    let mut hosts = Vec::new();
    if let (Ok(start_num), Ok(end_num)) = (start.parse::<usize>(), end.parse::<usize>()) {
        // db[01:10] keeps the width of the start value
        let width = if start.starts_with('0') { start.len() } else { 0 };
        check_range_size(pattern, end_num.saturating_sub(start_num), stride)?;
        for i in (start_num..=end_num).step_by(stride) {
            hosts.push(pattern.replace(full_match, &format!("{:0width$}", i, width = width)));
        }
    } else {
        let mut start_chars = start.chars();
        let mut end_chars = end.chars();
        match (start_chars.next(), end_chars.next()) {
            (Some(start_char), Some(end_char))
                if start_char.is_ascii_alphabetic()
                    && end_char.is_ascii_alphabetic()
                    && start_chars.next().is_none()
                    && end_chars.next().is_none() =>
            {
                check_range_size(
                    pattern,
                    (end_char as usize).saturating_sub(start_char as usize),
                    stride,
                )?;
                for c in (start_char..=end_char).step_by(stride) {
                    hosts.push(pattern.replace(full_match, &c.to_string()));
                }
            }
            _ => {
                return Err(Error::HostPattern(format!(
                    "invalid range in pattern: {}",
                    pattern
                )))
            }
        }
    }

    if hosts.is_empty() {
        return Err(Error::HostPattern(format!("empty range in {}", pattern)));
    }

    Ok(hosts)
}

fn check_range_size(pattern: &str, span: usize, stride: usize) -> Result<()> {
    let count = span / stride + 1;
    if count > MAX_RANGE_HOSTS {
        return Err(Error::HostPattern(format!(
            "{} expands to {} hosts, more than {}",
            pattern, count, MAX_RANGE_HOSTS
        )));
    }
    Ok(())
}
