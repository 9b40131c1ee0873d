use super::store::{challenge_name, Challenge};
use crate::config::types::{EvalError, Result};
use log::{debug, info};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::COOKIE;
use std::sync::OnceLock;
use std::time::Duration;

const PART_TWO_MARKER: &str = "--- Part Two ---";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn article_body() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<article class="day-desc">(.*?)</article>"#)
            .expect("static regex is valid")
    })
}

fn html_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex is valid"))
}

fn answer_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Your puzzle answer was.*").expect("static regex is valid"))
}

fn title_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(--- .* ---)(.*)").expect("static regex is valid"))
}

/// Fetches puzzle descriptions and inputs for an authenticated session.
#[derive(Debug, Clone)]
pub struct PuzzleClient {
    http: Client,
    base_url: String,
    session: String,
}

impl PuzzleClient {
    pub fn new(base_url: impl Into<String>, session: impl Into<String>) -> Result<Self> {
        let session = session.into();
        if session.trim().is_empty() {
            return Err(EvalError::Config("session token is required".to_string()));
        }
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    fn get(&self, path: &str, what: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .header(COOKIE, format!("session={}", self.session))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(EvalError::Http(format!(
                "failed to download challenge {}: {}",
                what, status
            )));
        }
        Ok(response.text()?)
    }

    /// Download one puzzle part. Part 0 is treated as part 1; the part 2 task
    /// carries the part 1 text before it.
    pub fn download(&self, day: u32, part: u32, year: u32) -> Result<Challenge> {
        let part = if part == 0 { 1 } else { part };
        let page = self.get(&format!("/{}/day/{}", year, day), "description")?;
        let input = self.get(&format!("/{}/day/{}/input", year, day), "input")?;

        let (part_one, part_two) = clean_task_description(&page);
        let task = if part == 2 {
            format!("{}\n\n{}", part_one, part_two)
        } else {
            part_one
        };

        let name = challenge_name(day, part, year);
        info!("Downloaded {} ({} bytes of input)", name, input.len());
        Ok(Challenge {
            name,
            input,
            task,
            year: i64::from(year),
            ..Challenge::default()
        })
    }
}

/// Plain-text part one and part two from a puzzle page. Part two is empty
/// until it has been unlocked.
pub fn clean_task_description(html: &str) -> (String, String) {
    let Some(body) = article_body()
        .captures(html)
        .and_then(|caps| caps.get(1))
    else {
        return (String::new(), String::new());
    };

    let stripped = html_tag().replace_all(body.as_str(), "");
    let text = html_escape::decode_html_entities(&stripped);
    let text = answer_line().replace_all(&text, "");

    let mut parts = text.splitn(2, PART_TWO_MARKER);
    let part_one = parts.next().unwrap_or_default().trim();
    let part_one = title_line().replace_all(part_one, "$1\n$2").into_owned();
    let part_two = parts
        .next()
        .map(|rest| format!("{}\n{}", PART_TWO_MARKER, rest.trim()))
        .unwrap_or_default();

    (part_one, part_two)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body><main>
<article class="day-desc"><h2>--- Day 1: Trebuchet?! ---</h2><p>Sum the &quot;calibration&quot; values &lt;here&gt;.</p>
<p>Your puzzle answer was <code>12345</code>.</p>
<h2 id="part2">--- Part Two ---</h2><p>Digits can be spelled &amp; counted.</p>
<p>Your puzzle answer was <code>67890</code>.</p></article>
</main></body></html>"#;

    #[test]
    fn test_clean_task_description_splits_parts() {
        let (one, two) = clean_task_description(PAGE);
        assert!(one.starts_with("--- Day 1: Trebuchet?! ---\n"));
        assert!(one.contains(r#"Sum the "calibration" values <here>."#));
        assert!(!one.contains("Your puzzle answer was"));
        assert!(!one.contains(PART_TWO_MARKER));

        assert!(two.starts_with("--- Part Two ---\n"));
        assert!(two.contains("spelled & counted"));
        assert!(!two.contains("67890"));
    }

    #[test]
    fn test_clean_task_description_without_article() {
        assert_eq!(
            clean_task_description("<p>nothing</p>"),
            (String::new(), String::new())
        );
    }

    #[test]
    fn test_entities_beyond_markup_basics_are_decoded() {
        let page = r#"<article class="day-desc"><h2>--- Day 6: Wait ---</h2><p>3 &times; 4 &rarr; 12, it&#39;s &#x41;&nbsp;race &amp; done</p></article>"#;
        let (one, _) = clean_task_description(page);
        assert!(one.contains("3 × 4 → 12, it's A\u{a0}race & done"), "{}", one);
    }

    #[test]
    fn test_session_is_required() {
        assert!(matches!(
            PuzzleClient::new("http://localhost", " "),
            Err(EvalError::Config(_))
        ));
    }
}
