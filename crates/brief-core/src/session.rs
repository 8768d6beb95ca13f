use crate::client::{ClientFactory, SharedClient};
use crate::env::EnvSnapshot;
use crate::provider::{ProviderId, lookup, resolve_credential};
use crate::summarize::prompts::question_prompt;
use crate::summarize::{Plan, Summarizer};
use crate::{PipelineError, ProviderError, SummarizeError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SUMMARY_FILE_NAME: &str = "document_summary.txt";
pub const SUMMARY_MIME: &str = "text/plain";

/// What the user picked for one "generate summary" action.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub provider: String,
    /// Empty selects the provider's default model.
    pub model: String,
    /// Empty falls back to the provider's environment variable.
    pub credential: String,
}

/// The last successful summary and the client that produced it.
pub struct SummaryResult {
    pub summary: String,
    pub plan: Plan,
    pub invocations: usize,
    pub source: String,
    client: SharedClient,
}

impl SummaryResult {
    pub fn provider(&self) -> ProviderId {
        self.client.provider()
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn artifact(&self) -> Artifact<'_> {
        Artifact {
            file_name: SUMMARY_FILE_NAME,
            mime: SUMMARY_MIME,
            contents: &self.summary,
        }
    }
}

impl fmt::Debug for SummaryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryResult")
            .field("summary", &self.summary)
            .field("plan", &self.plan)
            .field("invocations", &self.invocations)
            .field("source", &self.source)
            .field("provider", &self.provider())
            .field("model", &self.model())
            .finish()
    }
}

/// A downloadable copy of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Artifact<'a> {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub contents: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// State for one interactive session: the latest summary plus the Q&A transcript.
#[derive(Default)]
pub struct Session {
    summarizer: Summarizer,
    current: Option<SummaryResult>,
    transcript: Vec<ChatTurn>,
}

impl Session {
    pub fn new(summarizer: Summarizer) -> Self {
        Self {
            summarizer,
            current: None,
            transcript: Vec::new(),
        }
    }

    pub fn current(&self) -> Option<&SummaryResult> {
        self.current.as_ref()
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// Summarize `text` with a freshly built client. The previous result is
    /// replaced only when this succeeds.
    pub fn generate(
        &mut self,
        factory: &ClientFactory,
        env: &EnvSnapshot,
        request: &GenerateRequest,
        text: &str,
        source: &str,
    ) -> Result<&SummaryResult, PipelineError> {
        let spec = lookup(&request.provider)?;
        let model = match request.model.trim() {
            "" => spec.default_model(),
            model => model,
        };
        if !spec.supports(model) {
            return Err(ProviderError::UnsupportedModel {
                provider: spec.id.to_string(),
                model: model.to_string(),
            }
            .into());
        }
        let credential = resolve_credential(spec.id.as_str(), &request.credential, env)?;
        let client = factory.build(spec.id.as_str(), model, credential)?;

        tracing::info!(
            provider = %spec.id,
            model,
            source,
            "generating summary"
        );
        let summary = self.summarizer.summarize(client.as_ref(), text)?;
        tracing::info!(
            plan = ?summary.plan,
            invocations = summary.invocations,
            "summary ready"
        );

        let result = self.current.insert(SummaryResult {
            summary: summary.text,
            plan: summary.plan,
            invocations: summary.invocations,
            source: source.to_string(),
            client,
        });
        Ok(result)
    }

    /// Answer `question` from the current summary alone. Earlier turns are not
    /// sent to the model.
    pub fn ask(&mut self, question: &str) -> Result<&str, PipelineError> {
        let current = self.current.as_ref().ok_or(PipelineError::NoSummary)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(SummarizeError::InputEmpty.into());
        }

        let prompt = question_prompt(&current.summary, question);
        self.transcript.push(ChatTurn {
            role: Role::User,
            content: question.to_string(),
        });
        let answer = current.client.invoke(&prompt)?;
        tracing::debug!(turns = self.transcript.len() + 1, "question answered");

        self.transcript.push(ChatTurn {
            role: Role::Assistant,
            content: answer,
        });
        Ok(self
            .transcript
            .last()
            .map(|turn| turn.content.as_str())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InvokeError;
    use crate::client::{ClientOptions, ModelClient};
    use crate::provider::Credential;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct FakeClient {
        provider: ProviderId,
        model: String,
        calls: Arc<AtomicUsize>,
        prompts: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl ModelClient for FakeClient {
        fn provider(&self) -> ProviderId {
            self.provider
        }

        fn model(&self) -> &str {
            &self.model
        }

        fn invoke(&self, prompt: &str) -> Result<String, InvokeError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(InvokeError::Network("connection refused".into()));
            }
            Ok(format!("answer {call} from {}", self.model))
        }
    }

    struct Harness {
        factory: ClientFactory,
        calls: Arc<AtomicUsize>,
        prompts: Arc<Mutex<Vec<String>>>,
        credentials: Arc<Mutex<Vec<Credential>>>,
    }

    fn harness(fail: bool) -> Harness {
        let calls = Arc::new(AtomicUsize::new(0));
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let credentials = Arc::new(Mutex::new(Vec::new()));
        let mut factory = ClientFactory::new(ClientOptions::default());
        for id in ProviderId::ALL {
            let calls = Arc::clone(&calls);
            let prompts = Arc::clone(&prompts);
            let credentials = Arc::clone(&credentials);
            factory.register(id, move |params| {
                credentials.lock().unwrap().push(params.credential.clone());
                let client: SharedClient = Arc::new(FakeClient {
                    provider: params.provider,
                    model: params.model,
                    calls: Arc::clone(&calls),
                    prompts: Arc::clone(&prompts),
                    fail,
                });
                Ok(client)
            });
        }
        Harness {
            factory,
            calls,
            prompts,
            credentials,
        }
    }

    fn request(provider: &str, model: &str, credential: &str) -> GenerateRequest {
        GenerateRequest {
            provider: provider.to_string(),
            model: model.to_string(),
            credential: credential.to_string(),
        }
    }

    #[test]
    fn missing_credential_never_builds_or_invokes() {
        let h = harness(false);
        let mut session = Session::default();
        let err = session
            .generate(
                &h.factory,
                &EnvSnapshot::new(),
                &request("OpenAI", "gpt-4o-mini", ""),
                "some text",
                "notes.txt",
            )
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Provider(ProviderError::MissingCredential { ref env_var, .. })
                if env_var == "OPENAI_API_KEY"
        ));
        assert!(h.credentials.lock().unwrap().is_empty());
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
        assert!(session.current().is_none());
    }

    #[test]
    fn short_text_single_pass_with_openai() {
        let h = harness(false);
        let mut session = Session::default();
        let result = session
            .generate(
                &h.factory,
                &EnvSnapshot::new(),
                &request("OpenAI", "gpt-4o-mini", "sk-test"),
                "0123456789",
                "notes.txt",
            )
            .unwrap();
        assert_eq!(result.plan, Plan::SinglePass);
        assert_eq!(result.invocations, 1);
        assert!(!result.summary.is_empty());
        assert_eq!(result.provider(), ProviderId::OpenAI);
        assert_eq!(result.model(), "gpt-4o-mini");
        assert_eq!(result.source, "notes.txt");

        let artifact = result.artifact();
        assert_eq!(artifact.file_name, "document_summary.txt");
        assert_eq!(artifact.mime, "text/plain");
        assert_eq!(artifact.contents, result.summary);
    }

    #[test]
    fn summary_result_debug_names_provider_and_model() {
        let h = harness(false);
        let mut session = Session::default();
        let result = session
            .generate(
                &h.factory,
                &EnvSnapshot::new(),
                &request("OpenAI", "gpt-4o-mini", "sk-secret-value"),
                "0123456789",
                "notes.txt",
            )
            .unwrap();
        let printed = format!("{result:?}");
        assert!(printed.contains("OpenAI"));
        assert!(printed.contains("gpt-4o-mini"));
        assert!(printed.contains("notes.txt"));
        assert!(!printed.contains("sk-secret-value"));
    }

    #[test]
    fn environment_credential_is_used_when_none_supplied() {
        let h = harness(false);
        let env: EnvSnapshot = [("MISTRAL_API_KEY", "env-key")].into_iter().collect();
        let mut session = Session::default();
        session
            .generate(&h.factory, &env, &request("mistral", "", ""), "text", "url")
            .unwrap();
        assert_eq!(
            h.credentials.lock().unwrap().as_slice(),
            &[Credential::new("env-key")]
        );
        assert_eq!(
            session.current().map(SummaryResult::model),
            Some("mistral-small-latest")
        );
    }

    #[test]
    fn unsupported_model_is_rejected_before_credentials() {
        let h = harness(false);
        let mut session = Session::default();
        let err = session
            .generate(
                &h.factory,
                &EnvSnapshot::new(),
                &request("Claude", "gpt-4o", ""),
                "text",
                "src",
            )
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Provider(ProviderError::UnsupportedModel { .. })
        ));
    }

    #[test]
    fn failed_generation_keeps_previous_result() {
        let ok = harness(false);
        let failing = harness(true);
        let env = EnvSnapshot::new();
        let mut session = Session::default();
        session
            .generate(&ok.factory, &env, &request("OpenAI", "", "k"), "first", "a.txt")
            .unwrap();

        let err = session
            .generate(&failing.factory, &env, &request("OpenAI", "", "k"), "second", "b.txt")
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Summarize(SummarizeError::Invocation(InvokeError::Network(_)))
        ));
        let current = session.current().unwrap();
        assert_eq!(current.source, "a.txt");

        let err = session
            .generate(&ok.factory, &env, &request("OpenAI", "", "k"), "   ", "c.txt")
            .unwrap_err();
        assert!(matches!(err, PipelineError::Summarize(SummarizeError::InputEmpty)));
        assert_eq!(session.current().unwrap().source, "a.txt");
    }

    #[test]
    fn questions_need_a_summary() {
        let mut session = Session::default();
        assert!(matches!(session.ask("why?"), Err(PipelineError::NoSummary)));
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn questions_use_only_the_summary_and_append_turns() {
        let h = harness(false);
        let mut session = Session::default();
        session
            .generate(&h.factory, &EnvSnapshot::new(), &request("OpenAI", "", "k"), "doc", "d")
            .unwrap();
        let summary = session.current().unwrap().summary.clone();

        let first = session.ask("What is it about?").unwrap().to_string();
        assert_eq!(first, "answer 2 from gpt-4o-mini");
        session.ask("And then?").unwrap();

        let turns = session.transcript();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "What is it about?");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].content, first);
        assert_eq!(turns[2].content, "And then?");

        let prompts = h.prompts.lock().unwrap();
        let last = prompts.last().unwrap();
        assert_eq!(
            last,
            &format!(
                "Given the following summary:\n\n{summary}\n\nAnswer the user's question:\nAnd then?\n\nAnswer:"
            )
        );
        assert!(!last.contains("What is it about?"));
    }

    #[test]
    fn transcript_survives_regeneration() {
        let h = harness(false);
        let env = EnvSnapshot::new();
        let mut session = Session::default();
        session
            .generate(&h.factory, &env, &request("OpenAI", "", "k"), "one", "1")
            .unwrap();
        session.ask("q1").unwrap();
        session
            .generate(&h.factory, &env, &request("Gemini", "", "g"), "two", "2")
            .unwrap();
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.current().unwrap().provider(), ProviderId::Gemini);
    }
}
