//! Typed oracle calls built on the model client.
//!
//! Every call sends one prompt, waits under a per-attempt timeout and
//! retries transient failures with exponential backoff. Replies are read
//! with the tolerant parser, so a malformed reply degrades to defaults
//! instead of failing.

use std::fmt::{self, Display};
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use backoff::future::retry_notify;
use sleuth_model::{ModelProviderError, ModelRequest};
use tokio::time::timeout;

use crate::model_client::ModelClient;
use crate::parse;
use crate::prompt::{self, SourceContent};

const DEFAULT_CONFIDENCE: u8 = 50;

/// How failed oracle attempts are retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `0` disables retrying.
    pub max_retries: u32,
    /// The wait before the first retry.
    pub initial_interval: Duration,
    /// The upper bound of a single wait.
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(8),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleError {
    message: String,
}

impl Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    pub query: Option<String>,
    pub topics: Option<String>,
    pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assessment {
    pub confidence: u8,
    pub reasoning: String,
    pub next_query: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArticleDigest {
    pub summary: String,
    pub key_points: Vec<String>,
}

#[derive(Clone)]
pub struct Oracle {
    client: ModelClient,
    attempt_timeout: Duration,
    retry: RetryPolicy,
}

impl Oracle {
    #[inline]
    pub fn new(
        client: ModelClient,
        attempt_timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            attempt_timeout,
            retry,
        }
    }

    pub async fn plan(&self, request: &str) -> Result<Plan, OracleError> {
        let reply = self.complete("plan", prompt::plan(request)).await?;
        Ok(Plan {
            query: parse::field(&reply, "QUERY").map(str::to_owned),
            topics: parse::field(&reply, "TOPICS").map(str::to_owned),
            kind: parse::field(&reply, "TYPE").map(str::to_owned),
        })
    }

    pub async fn extract_findings(
        &self,
        request: &str,
        sources: &[SourceContent],
        content_prefix: usize,
        max_findings: usize,
    ) -> Result<Vec<String>, OracleError> {
        let prompt = prompt::extract_findings(
            request,
            sources,
            content_prefix,
            max_findings,
        );
        let reply = self.complete("extract findings", prompt).await?;
        let mut findings = parse::bullets(&reply);
        findings.truncate(max_findings);
        Ok(findings)
    }

    pub async fn assess(
        &self,
        request: &str,
        findings: &[String],
        threshold: u8,
    ) -> Result<Assessment, OracleError> {
        let prompt = prompt::assess(request, findings, threshold);
        let reply = self.complete("assess", prompt).await?;
        let confidence = parse::integer(&reply, "CONFIDENCE")
            .map_or(DEFAULT_CONFIDENCE, |c| c.min(100) as u8);
        Ok(Assessment {
            confidence,
            reasoning: parse::field(&reply, "REASONING")
                .unwrap_or_default()
                .to_owned(),
            next_query: parse::next_query(&reply, "NEXT_QUERY"),
        })
    }

    pub async fn synthesize<'a>(
        &self,
        request: &str,
        findings: impl IntoIterator<Item = &'a str>,
    ) -> Result<String, OracleError> {
        let prompt = prompt::synthesize(request, findings);
        let reply = self.complete("synthesize", prompt).await?;
        Ok(reply.trim().to_owned())
    }

    pub async fn analyze_article(
        &self,
        title: &str,
        url: &str,
        content: &str,
    ) -> Result<ArticleDigest, OracleError> {
        let prompt = prompt::analyze_article(title, url, content);
        let reply = self.complete("analyze article", prompt).await?;
        let summary = parse::section(&reply, "SUMMARY", Some("KEY POINTS"))
            .unwrap_or_else(|| reply.trim())
            .to_owned();
        let key_points = parse::section(&reply, "KEY POINTS", None)
            .map(parse::bullets)
            .unwrap_or_default();
        Ok(ArticleDigest {
            summary,
            key_points,
        })
    }

    async fn complete(
        &self,
        purpose: &'static str,
        prompt: String,
    ) -> Result<String, OracleError> {
        let request = ModelRequest::from_prompt(prompt);
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.retry.initial_interval)
            .with_max_interval(self.retry.max_interval)
            .with_max_elapsed_time(None)
            .build();

        let mut attempts = 0;
        let operation = || {
            attempts += 1;
            let is_last = attempts > self.retry.max_retries;
            let fut = timeout(
                self.attempt_timeout,
                self.client.send_request(request.clone()),
            );
            async move {
                let (message, transient) = match fut.await {
                    Ok(Ok(resp)) => return Ok(resp.transcript),
                    Ok(Err(err)) => (err.to_string(), err.kind().is_transient()),
                    Err(_) => (
                        format!("no reply within {:?}", self.attempt_timeout),
                        true,
                    ),
                };
                let err = OracleError { message };
                if transient && !is_last {
                    Err(backoff::Error::transient(err))
                } else {
                    Err(backoff::Error::permanent(err))
                }
            }
        };
        let notify = |err: OracleError, wait: Duration| {
            warn!("{purpose} failed ({err}), retrying in {wait:?}");
        };

        debug!("asking the oracle to {purpose}");
        let result = retry_notify(policy, operation, notify).await;
        if let Err(err) = &result {
            warn!("{purpose} gave up: {err}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use sleuth_model::ModelMessage;
    use sleuth_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    fn oracle(provider: &TestModelProvider, max_retries: u32) -> Oracle {
        let retry = RetryPolicy {
            max_retries,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(2),
        };
        Oracle::new(
            ModelClient::new(provider.clone()),
            Duration::from_secs(5),
            retry,
        )
    }

    #[tokio::test]
    async fn test_plan() {
        let provider = TestModelProvider::default();
        provider.add_text_response(
            "QUERY: firecrawl overview\nTOPICS: scraping\nTYPE: documentation",
        );
        provider.add_text_response("I am not sure what you mean.");
        let oracle = oracle(&provider, 0);

        let plan = oracle.plan("What is Firecrawl?").await.unwrap();
        assert_eq!(plan.query.as_deref(), Some("firecrawl overview"));
        assert_eq!(plan.topics.as_deref(), Some("scraping"));
        assert_eq!(plan.kind.as_deref(), Some("documentation"));

        let plan = oracle.plan("What is Firecrawl?").await.unwrap();
        assert_eq!(plan.query, None);

        let requests = provider.requests();
        let ModelMessage::User(prompt) = &requests[0].messages[0] else {
            panic!("expected a user prompt");
        };
        assert!(prompt.contains("Analyze this search request: \"What is Firecrawl?\""));
    }

    #[tokio::test]
    async fn test_assess_defaults() {
        let provider = TestModelProvider::default();
        provider.add_text_response(
            "CONFIDENCE: 140\nREASONING: Plenty.\nNEXT_QUERY: none",
        );
        provider.add_text_response("Looks fine to me.");
        let oracle = oracle(&provider, 0);

        let assessment = oracle.assess("q", &[], 85).await.unwrap();
        assert_eq!(assessment.confidence, 100);
        assert_eq!(assessment.reasoning, "Plenty.");
        assert_eq!(assessment.next_query, None);

        let assessment = oracle.assess("q", &[], 85).await.unwrap();
        assert_eq!(assessment.confidence, 50);
        assert_eq!(assessment.reasoning, "");
        assert_eq!(assessment.next_query, None);
    }

    #[tokio::test]
    async fn test_findings_are_capped() {
        let provider = TestModelProvider::default();
        provider.add_text_response("• One\n• Two\n• Three");
        let oracle = oracle(&provider, 0);
        let findings = oracle.extract_findings("q", &[], 1000, 2).await.unwrap();
        assert_eq!(findings, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn test_article_digest() {
        let provider = TestModelProvider::default();
        provider.add_text_response(
            "SUMMARY:\nA crawler for LLMs.\n\nKEY POINTS:\n• Markdown output\n• Open source",
        );
        provider.add_text_response("Just a plain summary.");
        let oracle = oracle(&provider, 0);

        let digest = oracle.analyze_article("t", "u", "c").await.unwrap();
        assert_eq!(digest.summary, "A crawler for LLMs.");
        assert_eq!(digest.key_points, vec!["Markdown output", "Open source"]);

        let digest = oracle.analyze_article("t", "u", "c").await.unwrap();
        assert_eq!(digest.summary, "Just a plain summary.");
        assert!(digest.key_points.is_empty());
    }

    #[tokio::test]
    async fn test_retry_transient_failures() {
        let provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("done").with_failures(2));
        let oracle = oracle(&provider, 2);
        let reply = oracle.synthesize("q", ["a"]).await.unwrap();
        assert_eq!(reply, "done");
        assert_eq!(provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_retry_budget() {
        let provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("done").with_failures(3));
        let oracle = oracle(&provider, 1);
        assert!(oracle.synthesize("q", ["a"]).await.is_err());
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout() {
        let mut provider = TestModelProvider::default();
        provider.set_delay(Duration::from_secs(10));
        provider.add_text_response("late");
        let oracle = oracle(&provider, 0);
        let err = oracle.synthesize("q", ["a"]).await.unwrap_err();
        assert!(err.to_string().starts_with("no reply within"));
    }
}
