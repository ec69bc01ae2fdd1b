pub mod batch;
pub mod evaluator;
pub mod trigger;

pub use evaluator::ResponseEvaluator;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::evaluations::requests::TriggerEvaluationRequest;
use crate::scoring::AutoScorer;
use crate::storage::Storage;

pub struct EvaluationService {
    storage: Option<Arc<dyn Storage>>,
    scorer: Option<Arc<dyn AutoScorer>>,
}

impl EvaluationService {
    pub fn new_lazy() -> Self {
        Self {
            storage: None,
            scorer: None,
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_scorer(&self, request: &HttpRequest) -> Arc<dyn AutoScorer> {
        if let Some(scorer) = &self.scorer {
            scorer.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn AutoScorer>>>()
                .expect("Scorer not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn evaluator(&self, request: &HttpRequest) -> ResponseEvaluator {
        ResponseEvaluator::new(self.get_storage(request), self.get_scorer(request))
    }

    pub async fn trigger_evaluation(
        &self,
        request: &HttpRequest,
        response_id: i64,
        reviewer_id: i64,
        req: TriggerEvaluationRequest,
    ) -> ActixResult<HttpResponse> {
        trigger::trigger_evaluation(self, request, response_id, reviewer_id, req).await
    }

    pub async fn evaluate_session(
        &self,
        request: &HttpRequest,
        session_id: i64,
    ) -> ActixResult<HttpResponse> {
        batch::evaluate_session(self, request, session_id).await
    }
}
