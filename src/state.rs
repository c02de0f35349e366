//! Application state: in-memory stores, prompts, the model gateway, and the
//! question/roadmap selection logic.
//!
//! This module owns:
//!   - roadmap stores (by id, by owner)
//!   - the prompts struct (from TOML or defaults)
//!   - the optional model gateway
//!   - the static question bank
//!
//! Assessment questions come from the model when the gateway is configured
//! and the returned set validates; otherwise the static bank serves.
//! Roadmap generation has no static fallback, so it requires the gateway.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use chrono::Utc;
use uuid::Uuid;

use crate::assess::{build_questions_prompt, validate_generated_questions};
use crate::bank::QuestionBank;
use crate::config::{load_agent_config_from_env, Prompts};
use crate::domain::{AssessmentQuestion, RoadmapPlan};
use crate::error::{GenerationError, ProviderError};
use crate::gateway::{Gateway, ModelTier};
use crate::roadmap::{generate_plan, GenerationRequest};
use crate::sanitize;

#[derive(Clone)]
pub struct AppState {
    pub roadmaps: Arc<RwLock<HashMap<String, RoadmapPlan>>>,
    pub by_owner: Arc<RwLock<HashMap<String, Vec<String>>>>,
    pub gateway: Option<Gateway>,
    pub prompts: Prompts,
    pub bank: QuestionBank,
}

impl AppState {
    /// Build state from env: load config, build the bank, init the gateway.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        // Load TOML config if provided (prompts + optional extra banks).
        let cfg_opt = load_agent_config_from_env();
        let prompts = cfg_opt
            .as_ref()
            .map(|c| c.prompts.clone())
            .unwrap_or_default();
        let bank = cfg_opt
            .as_ref()
            .map(|c| QuestionBank::from_config(&c.banks))
            .unwrap_or_default();

        let gateway = Gateway::from_env();
        if gateway.is_none() {
            info!(target: "skilltrail_backend", "Model gateway disabled (no MODEL_API_KEY). Assessments use the static bank; roadmap generation is unavailable.");
        }

        Self::with_parts(gateway, prompts, bank)
    }

    /// Assemble state from explicit parts. Tests use this to inject fakes.
    pub fn with_parts(gateway: Option<Gateway>, prompts: Prompts, bank: QuestionBank) -> Self {
        Self {
            roadmaps: Arc::new(RwLock::new(HashMap::new())),
            by_owner: Arc::new(RwLock::new(HashMap::new())),
            gateway,
            prompts,
            bank,
        }
    }

    /// Insert a roadmap into both stores (by id and by owner).
    #[instrument(level = "debug", skip(self, plan), fields(id = %plan.id))]
    pub async fn insert_roadmap(&self, plan: RoadmapPlan) {
        // Only place both locks are held, always plan map then owner index.
        let mut roadmaps = self.roadmaps.write().await;
        let mut by_owner = self.by_owner.write().await;
        by_owner
            .entry(plan.user_id.clone())
            .or_default()
            .push(plan.id.clone());
        roadmaps.insert(plan.id.clone(), plan);
    }

    /// Read-only access to a roadmap by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_roadmap(&self, id: &str) -> Option<RoadmapPlan> {
        let roadmaps = self.roadmaps.read().await;
        roadmaps.get(id).cloned()
    }

    /// All roadmaps owned by a user, in insertion order.
    #[instrument(level = "debug", skip(self), fields(%user_id))]
    pub async fn roadmaps_for_owner(&self, user_id: &str) -> Vec<RoadmapPlan> {
        // Scoped read: the owner index is released before the plan map is
        // locked, so readers never hold both stores at once.
        if let Some(ids) = { self.by_owner.read().await.get(user_id).cloned() } {
            let roadmaps = self.roadmaps.read().await;
            ids.iter().filter_map(|id| roadmaps.get(id).cloned()).collect()
        } else {
            Vec::new()
        }
    }

    /// Selection policy for assessment questions:
    /// generate a fresh set via the model when available and valid,
    /// otherwise serve the static bank.
    #[instrument(level = "info", skip(self), fields(%topic))]
    pub async fn choose_questions(&self, topic: &str) -> (Vec<AssessmentQuestion>, &'static str) {
        if let Some(gateway) = &self.gateway {
            let (system, user) = build_questions_prompt(&self.prompts, topic);
            match gateway.generate(ModelTier::Fast, &system, &user).await {
                Ok(raw) => {
                    let validated = match sanitize::parse(&raw) {
                        Some(value) => validate_generated_questions(&value),
                        None => Err("unrecoverable model output".to_string()),
                    };
                    match validated {
                        Ok(questions) => {
                            info!(target: "assessment", %topic, count = questions.len(), source = "model_generated", "Generated fresh question set");
                            return (questions, "model_generated");
                        }
                        Err(reason) => {
                            error!(target: "assessment", %topic, %reason, "Model question set rejected; using bank");
                        }
                    }
                }
                Err(e) => {
                    error!(target: "assessment", %topic, error = %e, "Model generation failed; using bank");
                }
            }
        } else {
            warn!(target: "assessment", %topic, "Model gateway not configured; using bank");
        }

        let questions = self.bank.questions_for(topic);
        warn!(target: "assessment", %topic, count = questions.len(), source = "fallback_bank", "Serving bank questions");
        (questions, "fallback_bank")
    }

    /// Generate, validate and persist a roadmap for one user.
    #[instrument(level = "info", skip(self, req), fields(%user_id, topic = %req.topic))]
    pub async fn create_roadmap(
        &self,
        user_id: &str,
        req: GenerationRequest,
    ) -> Result<RoadmapPlan, GenerationError> {
        let Some(gateway) = self.gateway.as_ref() else {
            return Err(GenerationError::Provider(ProviderError::permanent(
                "model gateway is not configured",
                None,
            )));
        };

        let generated = generate_plan(gateway, &self.prompts, &req).await?;

        let plan = RoadmapPlan {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            topic: generated.topic,
            duration: req.duration_days,
            level: generated.level,
            days: generated.days,
            created_at: Utc::now(),
        };
        self.insert_roadmap(plan.clone()).await;
        info!(target: "roadmap", id = %plan.id, %user_id, days = plan.days.len(), "Stored roadmap");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DayPlan, SkillLevel};
    use crate::error::ProviderError;
    use crate::gateway::{ModelClient, RetryPolicy};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::time::timeout;

    fn bare_state() -> AppState {
        AppState::with_parts(None, Prompts::default(), QuestionBank::default())
    }

    fn plan(id: &str, user_id: &str) -> RoadmapPlan {
        RoadmapPlan {
            id: id.into(),
            user_id: user_id.into(),
            topic: "Python".into(),
            duration: 1,
            level: SkillLevel::Beginner,
            days: vec![DayPlan { day_number: 1, estimated_minutes: 60, levels: vec![] }],
            created_at: Utc::now(),
        }
    }

    struct FixedClient {
        response: String,
    }

    #[async_trait]
    impl ModelClient for FixedClient {
        async fn complete(&self, _tier: ModelTier, _system: &str, _user: &str) -> Result<String, ProviderError> {
            Ok(self.response.clone())
        }
    }

    fn state_with_model(response: &str) -> AppState {
        let gateway = Gateway::new(
            Arc::new(FixedClient { response: response.into() }),
            RetryPolicy { max_retries: 0, base_delay: Duration::from_millis(1) },
        );
        AppState::with_parts(Some(gateway), Prompts::default(), QuestionBank::default())
    }

    #[tokio::test]
    async fn stores_keep_per_owner_insertion_order() {
        let state = bare_state();
        state.insert_roadmap(plan("r1", "u1")).await;
        state.insert_roadmap(plan("r2", "u1")).await;
        state.insert_roadmap(plan("r3", "u2")).await;

        let mine = state.roadmaps_for_owner("u1").await;
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, "r1");
        assert_eq!(mine[1].id, "r2");

        assert_eq!(state.roadmaps_for_owner("u2").await.len(), 1);
        assert!(state.roadmaps_for_owner("nobody").await.is_empty());

        assert!(state.get_roadmap("r2").await.is_some());
        assert!(state.get_roadmap("missing").await.is_none());
    }

    #[tokio::test]
    async fn listing_releases_the_owner_index_before_reading_plans() {
        let state = bare_state();
        state.insert_roadmap(plan("r1", "u1")).await;

        // Park every plan-map reader behind a writer.
        let plans_guard = state.roadmaps.write().await;

        let lister = tokio::spawn({
            let state = state.clone();
            async move { state.roadmaps_for_owner("u1").await }
        });
        tokio::task::yield_now().await;

        // The lister is parked on the plan map now; it must not be sitting
        // on the owner index, or a concurrent insert would wedge both stores.
        let owner_guard = timeout(Duration::from_millis(500), state.by_owner.write())
            .await
            .expect("owner index stayed writable while the plan map was held");
        drop(owner_guard);
        drop(plans_guard);

        let listed = timeout(Duration::from_millis(500), lister)
            .await
            .expect("listing finished once the plan map was released")
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "r1");
    }

    #[tokio::test]
    async fn questions_come_from_the_bank_without_a_gateway() {
        let state = bare_state();
        let (questions, origin) = state.choose_questions("react").await;
        assert_eq!(questions.len(), 10);
        assert_eq!(origin, "fallback_bank");
    }

    #[tokio::test]
    async fn questions_prefer_a_valid_model_set() {
        let set = QuestionBank::default().questions_for("python");
        let response = serde_json::to_string(&set).unwrap();
        let state = state_with_model(&response);

        let (questions, origin) = state.choose_questions("python").await;
        assert_eq!(origin, "model_generated");
        assert_eq!(questions.len(), 10);
    }

    #[tokio::test]
    async fn invalid_model_sets_fall_back_to_the_bank() {
        let state = state_with_model(r#"[{"question": "?", "options": ["a", "b"], "correct": 0, "difficulty": "Easy"}]"#);
        let (questions, origin) = state.choose_questions("javascript").await;
        assert_eq!(origin, "fallback_bank");
        assert_eq!(questions.len(), 10);
    }

    #[tokio::test]
    async fn create_roadmap_requires_the_gateway() {
        let state = bare_state();
        let req = GenerationRequest::from_params(
            Some("Python".into()),
            Some(3.0),
            Some("Beginner".into()),
            None,
            None,
        )
        .unwrap();

        let err = state.create_roadmap("u1", req).await.unwrap_err();
        assert!(matches!(err, GenerationError::Provider(_)));
    }
}
