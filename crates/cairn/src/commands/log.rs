use chrono::{DateTime, FixedOffset};
use libcairn_core::{refs, CairnError, Kvlm, Object, ObjectKind, ObjectStore};

use crate::commands::open_repo;

pub fn run(commit: &str, max_count: Option<usize>) -> Result<(), CairnError> {
    let repo = open_repo()?;
    let store = ObjectStore::open(&repo);

    let mut next = refs::resolve_typed(&repo, &store, commit, Some(ObjectKind::Commit), true)?;
    let mut remaining = max_count.unwrap_or(usize::MAX);
    let mut first = true;

    while let Some(sha) = next.take() {
        if remaining == 0 {
            break;
        }
        remaining -= 1;

        let body = match store.read(&sha)? {
            Object::Commit(body) => body,
            other => {
                return Err(CairnError::Malformed(format!(
                    "{} is a {}, not a commit",
                    sha,
                    other.kind()
                )))
            }
        };

        if !first {
            println!();
        }
        first = false;
        print_commit(&sha, &body);

        // First-parent walk.
        next = body
            .first(b"parent")
            .map(|p| String::from_utf8_lossy(p).into_owned());
    }

    Ok(())
}

fn print_commit(sha: &str, body: &Kvlm) {
    println!("commit {}", sha);
    if let Some(author) = body.first(b"author") {
        let author = String::from_utf8_lossy(author);
        let (who, date) = split_ident(&author);
        println!("Author: {}", who);
        if let Some(date) = date {
            println!("Date:   {}", date);
        }
    }
    println!();
    for line in String::from_utf8_lossy(body.message()).lines() {
        println!("    {}", line);
    }
}

/// Split `"Name <email> <unix-ts> <±HHMM>"` into the identity and a
/// formatted date. An identity without a parsable timestamp is printed
/// as-is.
fn split_ident(raw: &str) -> (String, Option<String>) {
    let mut parts = raw.rsplitn(3, ' ');
    let tz = parts.next();
    let ts = parts.next();
    let who = parts.next();

    let parsed = match (who, ts, tz) {
        (Some(who), Some(ts), Some(tz)) => {
            parse_timestamp(ts, tz).map(|date| (who.to_string(), Some(date)))
        }
        _ => None,
    };
    parsed.unwrap_or_else(|| (raw.to_string(), None))
}

fn parse_timestamp(ts: &str, tz: &str) -> Option<String> {
    let seconds: i64 = ts.parse().ok()?;
    if tz.len() != 5 {
        return None;
    }
    let (sign, digits) = tz.split_at(1);
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    let east = match sign {
        "+" => (hours * 60 + minutes) * 60,
        "-" => -(hours * 60 + minutes) * 60,
        _ => return None,
    };
    let offset = FixedOffset::east_opt(east)?;
    let date: DateTime<FixedOffset> = DateTime::from_timestamp(seconds, 0)?.with_timezone(&offset);
    Some(date.format("%a %b %e %H:%M:%S %Y %z").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ident_formats_date() {
        let (who, date) = split_ident("Alice <alice@example.com> 1700000000 +0200");
        assert_eq!(who, "Alice <alice@example.com>");
        let date = date.unwrap();
        assert!(date.contains("2023"));
        assert!(date.ends_with("+0200"));
    }

    #[test]
    fn test_split_ident_without_timestamp() {
        let (who, date) = split_ident("mystery");
        assert_eq!(who, "mystery");
        assert!(date.is_none());
    }
}
