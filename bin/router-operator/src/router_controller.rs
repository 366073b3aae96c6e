//! Router controller wiring the convergence core to the watch machinery

use futures::StreamExt;
use kube::{Api, Client};
use kube_runtime::{controller::Action, Controller};
use router_api::Router;
use router_core::{handle_notification, CoreError, Notification};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::kube_store::KubeStore;

pub struct RouterController {
    client: Client,
}

impl RouterController {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        info!("Starting Router reconciliation");

        let routers: Api<Router> = Api::all(self.client.clone());
        let store = Arc::new(KubeStore::new(self.client.clone()));

        // Watch for Router changes; deletions are left to owner-reference
        // garbage collection
        let controller = Controller::new(routers.clone(), Default::default());

        let mut stream = controller
            .run(
                |router, store| async move {
                    let name = router
                        .metadata
                        .name
                        .clone()
                        .unwrap_or_else(|| "unknown".to_string());
                    let namespace = router
                        .metadata
                        .namespace
                        .clone()
                        .unwrap_or_else(|| "default".to_string());
                    info!("Reconciling Router: {}/{}", namespace, name);

                    let notification = Notification::Router {
                        object: Box::new((*router).clone()),
                        deleted: false,
                    };
                    handle_notification(store.as_ref(), notification).await?;
                    Ok(Action::requeue(Duration::from_secs(300)))
                },
                |_router, error: &CoreError, _store| {
                    error!("Error reconciling Router: {}", error);
                    Action::requeue(Duration::from_secs(60))
                },
                store,
            )
            .boxed();

        // Process the reconciliation stream
        while let Some(item) = stream.next().await {
            match item {
                Ok(_) => debug!("Reconciled Router successfully"),
                Err(e) => error!("Error in reconciliation stream: {}", e),
            }
        }

        Ok(())
    }
}
