//! Intake-agent provisioning and status checks.
//!
//! These are admin/test operations. "Setup" is not guarded against double
//! provisioning; running it twice creates a second agent and phone number.

use serde::Serialize;

use crate::api::{VoiceApi, VoiceError, WebCallSession};

/// The multi-step script the intake agent follows on every call.
pub const INTAKE_SCRIPT: &str = "You are a donor intake assistant for a tissue donation program. \
Follow these steps in order and do not skip any:\n\
1. Greet the caller and ask for their recovery partner's identifying code. Repeat it back to \
confirm.\n\
2. Ask for the donor's full name.\n\
3. Ask for the donor's date of birth and sex.\n\
4. Ask for the blood type if known.\n\
5. Ask for the cause of death and date of death.\n\
6. Ask which tissue type is being offered and its condition.\n\
7. Summarize everything collected and confirm with the caller.\n\
8. Thank the caller and explain that the record will be reviewed by staff.\n\
Never diagnose, advise, or speculate. If the caller does not know an answer, accept that and \
move on.";

#[derive(Clone, Debug, Serialize)]
pub struct IntakeStatus {
    pub configured: bool,
    pub agent_id: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProvisionOutcome {
    pub agent_id: String,
    pub phone_number: String,
}

/// Reports whether an intake agent with the given name exists, and the
/// phone number bound to it if any.
pub async fn intake_status(
    api: &dyn VoiceApi,
    agent_name: &str,
) -> Result<IntakeStatus, VoiceError> {
    let agents = api.list_agents().await?;
    let agent = agents.into_iter().find(|a| a.agent_name.as_deref() == Some(agent_name));

    let Some(agent) = agent else {
        return Ok(IntakeStatus { configured: false, agent_id: None, phone_number: None });
    };

    let numbers = api.list_phone_numbers().await?;
    let phone_number = numbers
        .into_iter()
        .find(|n| n.agent_id.as_deref() == Some(agent.agent_id.as_str()))
        .map(|n| n.phone_number);

    Ok(IntakeStatus { configured: true, agent_id: Some(agent.agent_id), phone_number })
}

/// Provisions the full intake stack: reasoning backend, agent bound to the
/// intake script, and an inbound phone number wired to the webhook.
pub async fn provision_intake_agent(
    api: &dyn VoiceApi,
    agent_name: &str,
    webhook_base_url: &str,
) -> Result<ProvisionOutcome, VoiceError> {
    let webhook_url =
        format!("{}/api/v1/intake/webhook", webhook_base_url.trim_end_matches('/'));

    let llm_id = api.create_llm(INTAKE_SCRIPT).await?;
    let agent = api.create_agent(agent_name, &llm_id, &webhook_url).await?;
    let number = api.create_phone_number(&agent.agent_id).await?;

    Ok(ProvisionOutcome { agent_id: agent.agent_id, phone_number: number.phone_number })
}

/// Mints a browser call session against the named intake agent. Fails with
/// a clear not-configured message instead of provisioning implicitly.
pub async fn mint_web_call(
    api: &dyn VoiceApi,
    agent_name: &str,
) -> Result<WebCallSession, VoiceError> {
    let agents = api.list_agents().await?;
    let agent = agents
        .into_iter()
        .find(|a| a.agent_name.as_deref() == Some(agent_name))
        .ok_or_else(|| {
            VoiceError::NotConfigured(format!(
                "intake agent `{agent_name}` does not exist; run setup first"
            ))
        })?;

    api.create_web_call(&agent.agent_id).await
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::{intake_status, mint_web_call, provision_intake_agent};
    use crate::api::{VoiceAgent, VoiceApi, VoiceError, VoicePhoneNumber, WebCallSession};

    enum Scripted {
        Agents(Vec<VoiceAgent>),
        Numbers(Vec<VoicePhoneNumber>),
        LlmId(String),
        Agent(VoiceAgent),
        Number(VoicePhoneNumber),
        WebCall(WebCallSession),
    }

    struct ScriptedVoiceApi {
        responses: Mutex<VecDeque<Scripted>>,
    }

    impl ScriptedVoiceApi {
        fn new(responses: Vec<Scripted>) -> Self {
            Self { responses: Mutex::new(responses.into_iter().collect()) }
        }

        async fn next(&self) -> Scripted {
            self.responses.lock().await.pop_front().expect("scripted response available")
        }
    }

    #[async_trait]
    impl VoiceApi for ScriptedVoiceApi {
        async fn list_agents(&self) -> Result<Vec<VoiceAgent>, VoiceError> {
            match self.next().await {
                Scripted::Agents(agents) => Ok(agents),
                _ => panic!("unexpected list_agents call"),
            }
        }

        async fn list_phone_numbers(&self) -> Result<Vec<VoicePhoneNumber>, VoiceError> {
            match self.next().await {
                Scripted::Numbers(numbers) => Ok(numbers),
                _ => panic!("unexpected list_phone_numbers call"),
            }
        }

        async fn create_llm(&self, _prompt: &str) -> Result<String, VoiceError> {
            match self.next().await {
                Scripted::LlmId(id) => Ok(id),
                _ => panic!("unexpected create_llm call"),
            }
        }

        async fn create_agent(
            &self,
            _agent_name: &str,
            _llm_id: &str,
            _webhook_url: &str,
        ) -> Result<VoiceAgent, VoiceError> {
            match self.next().await {
                Scripted::Agent(agent) => Ok(agent),
                _ => panic!("unexpected create_agent call"),
            }
        }

        async fn create_phone_number(
            &self,
            _agent_id: &str,
        ) -> Result<VoicePhoneNumber, VoiceError> {
            match self.next().await {
                Scripted::Number(number) => Ok(number),
                _ => panic!("unexpected create_phone_number call"),
            }
        }

        async fn create_web_call(&self, _agent_id: &str) -> Result<WebCallSession, VoiceError> {
            match self.next().await {
                Scripted::WebCall(session) => Ok(session),
                _ => panic!("unexpected create_web_call call"),
            }
        }
    }

    fn agent(id: &str, name: &str) -> VoiceAgent {
        VoiceAgent { agent_id: id.to_string(), agent_name: Some(name.to_string()) }
    }

    #[tokio::test]
    async fn status_reports_unconfigured_when_agent_missing() {
        let api = ScriptedVoiceApi::new(vec![Scripted::Agents(vec![agent(
            "agent_1",
            "Some Other Agent",
        )])]);

        let status = intake_status(&api, "Donor Intake Line").await.expect("status");
        assert!(!status.configured);
        assert!(status.agent_id.is_none());
        assert!(status.phone_number.is_none());
    }

    #[tokio::test]
    async fn status_reports_agent_and_bound_number() {
        let api = ScriptedVoiceApi::new(vec![
            Scripted::Agents(vec![agent("agent_1", "Donor Intake Line")]),
            Scripted::Numbers(vec![VoicePhoneNumber {
                phone_number: "+15550100".to_string(),
                agent_id: Some("agent_1".to_string()),
            }]),
        ]);

        let status = intake_status(&api, "Donor Intake Line").await.expect("status");
        assert!(status.configured);
        assert_eq!(status.agent_id.as_deref(), Some("agent_1"));
        assert_eq!(status.phone_number.as_deref(), Some("+15550100"));
    }

    #[tokio::test]
    async fn provisioning_creates_llm_agent_and_number() {
        let api = ScriptedVoiceApi::new(vec![
            Scripted::LlmId("llm_1".to_string()),
            Scripted::Agent(agent("agent_1", "Donor Intake Line")),
            Scripted::Number(VoicePhoneNumber {
                phone_number: "+15550100".to_string(),
                agent_id: Some("agent_1".to_string()),
            }),
        ]);

        let outcome =
            provision_intake_agent(&api, "Donor Intake Line", "https://donorway.example/")
                .await
                .expect("provision");
        assert_eq!(outcome.agent_id, "agent_1");
        assert_eq!(outcome.phone_number, "+15550100");
    }

    #[tokio::test]
    async fn web_call_fails_clearly_when_agent_absent() {
        let api = ScriptedVoiceApi::new(vec![Scripted::Agents(vec![])]);

        let error = mint_web_call(&api, "Donor Intake Line").await.expect_err("should fail");
        assert!(matches!(error, VoiceError::NotConfigured(_)));
        assert!(error.to_string().contains("Donor Intake Line"));
    }

    #[tokio::test]
    async fn web_call_mints_session_for_named_agent() {
        let api = ScriptedVoiceApi::new(vec![
            Scripted::Agents(vec![agent("agent_1", "Donor Intake Line")]),
            Scripted::WebCall(WebCallSession {
                call_id: "call_1".to_string(),
                access_token: "tok_abc".to_string(),
            }),
        ]);

        let session = mint_web_call(&api, "Donor Intake Line").await.expect("mint");
        assert_eq!(session.access_token, "tok_abc");
    }
}
