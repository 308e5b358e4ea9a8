//! Endpoint reachability checks and ranking of sweep results.

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::cmp::Ordering;
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::ProbeError;
use crate::store::ProfileSet;

/// What one probe observed, before it is attached to a profile name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Online { status: u16, reason: String },
    Offline(ProbeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub elapsed_ms: u64,
    pub outcome: ProbeOutcome,
}

impl Measurement {
    fn timed_out(timeout: Duration) -> Self {
        Self {
            elapsed_ms: duration_ms(timeout),
            outcome: ProbeOutcome::Offline(ProbeError::Timeout),
        }
    }

    fn failed(started: Instant, message: String) -> Self {
        Self {
            elapsed_ms: duration_ms(started.elapsed()),
            outcome: ProbeOutcome::Offline(ProbeError::Transport(message)),
        }
    }
}

/// One row of a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub name: String,
    pub elapsed_ms: u64,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn new(name: &str, measurement: Measurement) -> Self {
        Self {
            name: name.to_string(),
            elapsed_ms: measurement.elapsed_ms,
            outcome: measurement.outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Online { .. })
    }

    pub fn error(&self) -> Option<&ProbeError> {
        match &self.outcome {
            ProbeOutcome::Offline(err) => Some(err),
            ProbeOutcome::Online { .. } => None,
        }
    }

    pub fn status(&self) -> Option<(u16, &str)> {
        match &self.outcome {
            ProbeOutcome::Online { status, reason } => Some((*status, reason.as_str())),
            ProbeOutcome::Offline(_) => None,
        }
    }
}

/// Presentation bucket for a latency value. Ranking ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyBand {
    Fast,
    Moderate,
    Slow,
}

impl LatencyBand {
    pub fn from_ms(ms: u64) -> Self {
        match ms {
            0..200 => LatencyBand::Fast,
            200..500 => LatencyBand::Moderate,
            _ => LatencyBand::Slow,
        }
    }
}

/// Something that can check one endpoint.
pub trait Prober {
    fn probe(&self, endpoint_url: &str, timeout: Duration) -> Measurement;
}

/// Sends a single `HEAD /` with reqwest's blocking client.
///
/// Requests always go straight to the endpoint; `HTTP_PROXY`/`HTTPS_PROXY` are ignored.
#[derive(Debug, Clone, Default)]
pub struct HttpProber;

impl HttpProber {
    pub fn new() -> Self {
        Self
    }

    fn client(&self, timeout: Duration) -> reqwest::Result<Client> {
        Client::builder()
            .user_agent(concat!("claude-config/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .redirect(Policy::none())
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()
    }
}

impl Prober for HttpProber {
    fn probe(&self, endpoint_url: &str, timeout: Duration) -> Measurement {
        let started = Instant::now();

        let url = match root_url(endpoint_url) {
            Ok(url) => url,
            Err(message) => return Measurement::failed(started, message),
        };
        let client = match self.client(timeout) {
            Ok(client) => client,
            Err(e) => return Measurement::failed(started, innermost_message(&e)),
        };

        let started = Instant::now();
        let measurement = match client.head(url.clone()).send() {
            // dropping the response closes the connection; the pool keeps nothing idle
            Ok(response) => {
                let status = response.status();
                Measurement {
                    elapsed_ms: duration_ms(started.elapsed()),
                    outcome: ProbeOutcome::Online {
                        status: status.as_u16(),
                        reason: status.canonical_reason().unwrap_or("").to_string(),
                    },
                }
            }
            Err(e) if e.is_timeout() => Measurement::timed_out(timeout),
            Err(e) => Measurement::failed(started, innermost_message(&e)),
        };

        debug!(
            url = %url,
            elapsed_ms = measurement.elapsed_ms,
            outcome = ?measurement.outcome,
            "probed endpoint"
        );
        measurement
    }
}

/// Same scheme, host and port, path `/`, no query or fragment.
fn root_url(endpoint_url: &str) -> Result<Url, String> {
    let mut url = Url::parse(endpoint_url.trim()).map_err(|e| format!("Invalid URL: {e}"))?;
    if url.cannot_be_a_base() {
        return Err(format!("Invalid URL: {endpoint_url}"));
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// The most specific message in an error chain, e.g. `Connection refused (os error 111)`.
fn innermost_message(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Receives progress while a sweep runs.
pub trait SweepObserver {
    fn started(&mut self, _name: &str) {}
    fn finished(&mut self, _result: &ProbeResult) {}
}

impl SweepObserver for () {}

/// Probe every profile one after another, in store order.
pub fn probe_all<P, O>(
    prober: &P,
    profiles: &ProfileSet,
    timeout: Duration,
    observer: &mut O,
) -> Vec<ProbeResult>
where
    P: Prober + ?Sized,
    O: SweepObserver + ?Sized,
{
    let mut results = Vec::with_capacity(profiles.len());
    for (name, profile) in profiles.iter() {
        observer.started(name);
        let result = ProbeResult::new(name, prober.probe(&profile.base_url, timeout));
        observer.finished(&result);
        results.push(result);
    }
    results
}

/// Successes first by ascending latency; failures keep their relative order.
pub fn rank(mut results: Vec<ProbeResult>) -> Vec<ProbeResult> {
    results.sort_by(compare_results);
    results
}

fn compare_results(a: &ProbeResult, b: &ProbeResult) -> Ordering {
    match (a.is_success(), b.is_success()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => a.elapsed_ms.cmp(&b.elapsed_ms),
        (false, false) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Profile;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn online(name: &str, ms: u64) -> ProbeResult {
        ProbeResult {
            name: name.to_string(),
            elapsed_ms: ms,
            outcome: ProbeOutcome::Online {
                status: 200,
                reason: "OK".to_string(),
            },
        }
    }

    fn offline(name: &str, ms: u64, error: ProbeError) -> ProbeResult {
        ProbeResult {
            name: name.to_string(),
            elapsed_ms: ms,
            outcome: ProbeOutcome::Offline(error),
        }
    }

    fn names(results: &[ProbeResult]) -> Vec<&str> {
        results.iter().map(|r| r.name.as_str()).collect()
    }

    /// Answers from a fixed table and records the order of calls.
    struct TableProber {
        answers: HashMap<String, Measurement>,
        calls: RefCell<Vec<(String, Duration)>>,
    }

    impl Prober for TableProber {
        fn probe(&self, endpoint_url: &str, timeout: Duration) -> Measurement {
            self.calls
                .borrow_mut()
                .push((endpoint_url.to_string(), timeout));
            self.answers
                .get(endpoint_url)
                .cloned()
                .unwrap_or_else(|| Measurement::timed_out(timeout))
        }
    }

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl SweepObserver for Recorder {
        fn started(&mut self, name: &str) {
            self.0.push(format!("start {name}"));
        }
        fn finished(&mut self, result: &ProbeResult) {
            self.0.push(format!("done {}", result.name));
        }
    }

    #[test]
    fn rank_puts_successes_first_by_latency() {
        let ranked = rank(vec![
            offline("down", 12, ProbeError::Transport("refused".into())),
            online("slow", 700),
            online("fast", 40),
            offline("late", 3000, ProbeError::Timeout),
            online("mid", 300),
        ]);

        assert_eq!(names(&ranked), vec!["fast", "mid", "slow", "down", "late"]);
    }

    #[test]
    fn rank_keeps_failure_order_regardless_of_latency() {
        let ranked = rank(vec![
            offline("b", 3000, ProbeError::Timeout),
            offline("a", 5, ProbeError::Transport("dns".into())),
            online("ok", 100),
            offline("c", 1, ProbeError::Timeout),
        ]);

        assert_eq!(names(&ranked), vec!["ok", "b", "a", "c"]);
    }

    #[test]
    fn rank_is_stable_for_equal_latency() {
        let ranked = rank(vec![online("first", 50), online("second", 50)]);
        assert_eq!(names(&ranked), vec!["first", "second"]);
    }

    #[test]
    fn rank_of_nothing_is_nothing() {
        assert!(rank(Vec::new()).is_empty());
    }

    #[test]
    fn probe_all_returns_one_result_per_profile_in_order() {
        let mut profiles = ProfileSet::new();
        profiles.insert("a", Profile::new("https://a.example", "t", ""));
        profiles.insert("b", Profile::new("http://127.0.0.1:1", "t", ""));
        profiles.insert("c", Profile::new("https://c.example", "t", ""));

        let mut answers = HashMap::new();
        answers.insert(
            "https://a.example".to_string(),
            Measurement {
                elapsed_ms: 80,
                outcome: ProbeOutcome::Online {
                    status: 404,
                    reason: "Not Found".into(),
                },
            },
        );
        answers.insert(
            "http://127.0.0.1:1".to_string(),
            Measurement {
                elapsed_ms: 2,
                outcome: ProbeOutcome::Offline(ProbeError::Transport(
                    "Connection refused (os error 111)".into(),
                )),
            },
        );
        let prober = TableProber {
            answers,
            calls: RefCell::new(Vec::new()),
        };
        let mut recorder = Recorder::default();
        let timeout = Duration::from_millis(3000);

        let results = probe_all(&prober, &profiles, timeout, &mut recorder);

        assert_eq!(names(&results), vec!["a", "b", "c"]);
        assert!(results[0].is_success());
        assert_eq!(results[2].error(), Some(&ProbeError::Timeout));
        assert_eq!(results[2].elapsed_ms, 3000);
        assert_eq!(
            recorder.0,
            vec!["start a", "done a", "start b", "done b", "start c", "done c"]
        );
        assert!(prober.calls.borrow().iter().all(|(_, t)| *t == timeout));

        let ranked = rank(results);
        assert_eq!(names(&ranked), vec!["a", "b", "c"]);
    }

    #[test]
    fn probe_all_over_empty_set_is_empty() {
        let prober = TableProber {
            answers: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        };
        let results = probe_all(&prober, &ProfileSet::new(), Duration::from_secs(1), &mut ());
        assert!(results.is_empty());
        assert!(prober.calls.borrow().is_empty());
    }

    #[test]
    fn latency_bands() {
        assert_eq!(LatencyBand::from_ms(0), LatencyBand::Fast);
        assert_eq!(LatencyBand::from_ms(199), LatencyBand::Fast);
        assert_eq!(LatencyBand::from_ms(200), LatencyBand::Moderate);
        assert_eq!(LatencyBand::from_ms(499), LatencyBand::Moderate);
        assert_eq!(LatencyBand::from_ms(500), LatencyBand::Slow);
    }

    #[test]
    fn root_url_drops_path_and_query() {
        let url = root_url("https://api.openai.com/v1?x=1#frag").unwrap();
        assert_eq!(url.as_str(), "https://api.openai.com/");

        let url = root_url("http://localhost:8080").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn malformed_url_is_a_transport_failure() {
        let m = HttpProber::new().probe("not a url", Duration::from_millis(500));
        match m.outcome {
            ProbeOutcome::Offline(ProbeError::Transport(msg)) => {
                assert!(msg.starts_with("Invalid URL"), "{msg}")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn timeout_displays_as_timeout() {
        assert_eq!(ProbeError::Timeout.to_string(), "Timeout");
    }
}
