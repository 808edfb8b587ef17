use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use super::strategy::{VariationParams, VariationStrategy};
use crate::backend::{
    build_prompt, parse_pattern, parse_reply, BackendCapability, BackendError, BackendRequest,
    GenerativeBackend,
};
use crate::pattern::Pattern;
use crate::transform::{
    densify, groove_preserve, humanize, mutate, random_combination, shift, simplify,
    DensifyParams, GrooveParams, HumanizeParams, MutateParams, ShiftParams, SimplifyParams,
};

pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("pattern has no hits")]
    EmptyPattern,
}

/// Routes a pattern to the chosen strategy.
///
/// Generative failures of any kind degrade to `groove_preserve` with default
/// parameters. The rng is only consumed by algorithmic strategies, so a failed
/// generative call draws exactly what `groove_preserve` alone would.
/// A strategy that drops every hit also degrades to `groove_preserve`, so a
/// non-empty input always yields a non-empty variation.
pub struct Dispatcher {
    backend: Arc<dyn GenerativeBackend>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn capability(&self) -> BackendCapability {
        self.backend.capability()
    }

    pub async fn generate<R: Rng + Send + ?Sized>(
        &self,
        pattern: &Pattern,
        strategy: VariationStrategy,
        params: &VariationParams,
        rng: &mut R,
    ) -> Result<Pattern, DispatchError> {
        if pattern.is_empty() {
            return Err(DispatchError::EmptyPattern);
        }

        let factor = params.spice_factor();
        log::debug!(
            "Generating {} variation ({} hits, spice {:.2})",
            strategy,
            pattern.len(),
            params.spice
        );

        let variation = match strategy {
            VariationStrategy::Generative => match self.try_backend(pattern, params).await {
                Ok(variation) => variation,
                Err(e) => {
                    log::warn!("Generative backend failed ({}), using groove_preserve", e);
                    groove_preserve(pattern, &GrooveParams::default(), rng)
                }
            },
            VariationStrategy::GroovePreserve => {
                groove_preserve(pattern, &GrooveParams::default().scaled(factor), rng)
            }
            VariationStrategy::Humanize => {
                humanize(pattern, &HumanizeParams::default().scaled(factor), rng)
            }
            VariationStrategy::Mutate => {
                mutate(pattern, &MutateParams::default().scaled(factor), rng)
            }
            VariationStrategy::Densify => {
                densify(pattern, &DensifyParams::default().scaled(factor), rng)
            }
            VariationStrategy::Simplify => {
                simplify(pattern, &SimplifyParams::default().scaled(factor), rng)
            }
            VariationStrategy::Shift => shift(pattern, &ShiftParams::default(), rng),
            VariationStrategy::Random => random_combination(pattern, rng),
        };

        if variation.is_empty() {
            log::warn!("{} removed every hit, using groove_preserve", strategy);
            return Ok(groove_preserve(pattern, &GrooveParams::default(), rng));
        }

        Ok(variation)
    }

    async fn try_backend(
        &self,
        pattern: &Pattern,
        params: &VariationParams,
    ) -> Result<Pattern, BackendError> {
        if let BackendCapability::Unavailable { reason } = self.backend.capability() {
            return Err(BackendError::Unavailable(reason));
        }

        let request = BackendRequest {
            prompt: build_prompt(pattern, params.spice),
            temperature: params.temperature,
        };

        let text = tokio::time::timeout(self.timeout, self.backend.complete(&request))
            .await
            .map_err(|_| BackendError::Timeout(self.timeout))??;

        let reply = parse_reply(&text)?;
        if !reply.reasoning.is_empty() {
            log::info!("Backend reasoning: {}", reply.reasoning);
        }

        let variation = parse_pattern(&reply.pattern, pattern.loop_duration)?;
        log::info!(
            "Backend produced {} hits (original {})",
            variation.len(),
            pattern.len()
        );
        Ok(variation.with_source(pattern.source.clone()))
    }
}
