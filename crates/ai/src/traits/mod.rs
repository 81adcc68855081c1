mod image_caption;

pub use image_caption::*;

use crate::HandlerPayload;
use futures::Future;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};

pub trait Model {
    type Item;
    type Output;

    fn process(
        &mut self,
        items: Vec<Self::Item>,
    ) -> impl std::future::Future<Output = anyhow::Result<Vec<anyhow::Result<Self::Output>>>> + Send;

    fn batch_size_limit(&self) -> usize;
}

pub type HandlerTx<Item, Output> = mpsc::Sender<HandlerPayload<Item, Output>>;

/// Owns the one model instance on a dedicated thread and serializes every
/// inference call through a channel (generation mutates the kv cache, so
/// concurrent access is not an option).
///
/// The model is created eagerly: `new` only returns once the load finished,
/// and a failed load fails construction instead of surfacing on the first
/// request. The model is never offloaded afterwards.
#[derive(Debug)]
pub struct ModelHandler<TItem, TOutput> {
    model_id: String, // for better logging
    tx: HandlerTx<TItem, TOutput>,
}

impl<TItem, TOutput> Clone for ModelHandler<TItem, TOutput> {
    fn clone(&self) -> Self {
        Self {
            model_id: self.model_id.clone(),
            tx: self.tx.clone(),
        }
    }
}

impl<TItem, TOutput> ModelHandler<TItem, TOutput>
where
    TItem: Send + Sync + Clone + Debug + 'static,
    TOutput: Send + Sync + Debug + 'static,
{
    pub async fn new<T, TFut, TFn>(model_id: &str, create_model: TFn) -> anyhow::Result<Self>
    where
        T: Model<Item = TItem, Output = TOutput> + 'static,
        TFut: Future<Output = anyhow::Result<T>> + 'static,
        TFn: FnOnce() -> TFut + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<HandlerPayload<TItem, TOutput>>(512);
        let (ready_tx, ready_rx) = oneshot::channel::<anyhow::Result<()>>();

        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.into()));
                    return;
                }
            };

            let local = tokio::task::LocalSet::new();

            local.spawn_local(async move {
                let mut model = match create_model().await {
                    Ok(model) => {
                        let _ = ready_tx.send(Ok(()));
                        model
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while let Some((items, result_tx)) = rx.recv().await {
                    // If the reply channel closed, we have no way to
                    // respond, just ignore the task. This is very useful
                    // for request cancellation.
                    if result_tx.is_closed() {
                        continue;
                    }

                    let results = model.process(items).await;
                    if result_tx.send(results).is_err() {
                        tracing::error!("failed to send results");
                    }
                }

                tracing::warn!("all tx dropped, end loop");
            });

            rt.block_on(local);
        });

        match ready_rx.await {
            Ok(load_result) => load_result?,
            Err(e) => anyhow::bail!("model thread exited before loading: {:?}", e),
        }

        Ok(Self {
            model_id: model_id.to_string(),
            tx,
        })
    }

    #[tracing::instrument(name = "ModelHandler::process", err(Debug), skip_all, fields(model_id=%self.model_id))]
    pub async fn process(&self, items: Vec<TItem>) -> anyhow::Result<Vec<anyhow::Result<TOutput>>> {
        let (result_tx, rx) = oneshot::channel();
        match self.tx.send((items, result_tx)).await {
            Ok(_) => {
                tracing::debug!("items sent to model");
            }
            Err(e) => {
                anyhow::bail!("failed to send items: {:?}", e);
            }
        }

        match rx.await {
            Ok(result) => result,
            Err(e) => {
                anyhow::bail!("failed to receive results: {:?}", e);
            }
        }
    }

    #[tracing::instrument(name = "ModelHandler::process_single", err(Debug), skip_all, fields(model_id=%self.model_id))]
    pub async fn process_single(&self, item: TItem) -> anyhow::Result<TOutput> {
        let results = self.process(vec![item]).await?;
        let result = results
            .into_iter()
            .next()
            .ok_or(anyhow::anyhow!("no result"))??;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shout;

    impl Model for Shout {
        type Item = String;
        type Output = String;

        async fn process(
            &mut self,
            items: Vec<Self::Item>,
        ) -> anyhow::Result<Vec<anyhow::Result<Self::Output>>> {
            Ok(items.into_iter().map(|s| Ok(s.to_uppercase())).collect())
        }

        fn batch_size_limit(&self) -> usize {
            8
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_process_single() {
        let handler = ModelHandler::new("shout", || async { Ok(Shout) })
            .await
            .expect("create handler");
        let out = handler
            .process_single("elementary".to_string())
            .await
            .expect("process");
        assert_eq!(out, "ELEMENTARY");
    }

    #[test_log::test(tokio::test)]
    async fn test_requests_are_answered_in_order() {
        let handler = ModelHandler::new("shout", || async { Ok(Shout) })
            .await
            .expect("create handler");
        let results = handler
            .process(vec!["watson".to_string(), "lestrade".to_string()])
            .await
            .expect("process");
        let results: Vec<String> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(results, vec!["WATSON".to_string(), "LESTRADE".to_string()]);
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_load_fails_construction() {
        let res = ModelHandler::<String, String>::new("broken", || async {
            Err::<Shout, _>(anyhow::anyhow!("weights missing"))
        })
        .await;
        assert!(res.is_err());
    }
}
