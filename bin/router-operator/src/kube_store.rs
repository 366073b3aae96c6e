//! Kubernetes-backed implementation of the store primitives

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::api::{Api, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use router_api::Router;
use router_core::{CreateOutcome, Store, StoreError};
use serde_json::json;

/// Store primitives backed by the cluster API server.
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn services(&self, namespace: &str) -> Api<Service> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn create_outcome<K>(result: kube::Result<K>) -> Result<CreateOutcome, StoreError> {
    match result {
        Ok(_) => Ok(CreateOutcome::Created),
        Err(kube::Error::Api(response)) if response.code == 409 => Ok(CreateOutcome::AlreadyExists),
        Err(error) => Err(error.into()),
    }
}

#[async_trait]
impl Store for KubeStore {
    async fn create_deployment(
        &self,
        namespace: &str,
        desired: Deployment,
    ) -> Result<CreateOutcome, StoreError> {
        create_outcome(
            self.deployments(namespace)
                .create(&PostParams::default(), &desired)
                .await,
        )
    }

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Deployment, StoreError> {
        Ok(self.deployments(namespace).get(name).await?)
    }

    async fn update_deployment(
        &self,
        namespace: &str,
        deployment: Deployment,
    ) -> Result<(), StoreError> {
        let name = deployment.name_any();
        self.deployments(namespace)
            .replace(&name, &PostParams::default(), &deployment)
            .await?;
        Ok(())
    }

    async fn create_service(
        &self,
        namespace: &str,
        desired: Service,
    ) -> Result<CreateOutcome, StoreError> {
        create_outcome(
            self.services(namespace)
                .create(&PostParams::default(), &desired)
                .await,
        )
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, StoreError> {
        Ok(self.services(namespace).get(name).await?)
    }

    async fn update_service(&self, namespace: &str, service: Service) -> Result<(), StoreError> {
        let name = service.name_any();
        self.services(namespace)
            .replace(&name, &PostParams::default(), &service)
            .await?;
        Ok(())
    }

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Pod>, StoreError> {
        let params = ListParams::default().labels(label_selector);
        let pods = self.pods(namespace).list(&params).await?;
        Ok(pods.items)
    }

    async fn update_router_status(&self, router: Router) -> Result<(), StoreError> {
        let namespace = router.namespace().unwrap_or_else(|| "default".to_string());
        let api: Api<Router> = Api::namespaced(self.client.clone(), &namespace);
        let status = json!({ "status": router.status });
        api.patch_status(
            &router.name_any(),
            &PatchParams::default(),
            &Patch::Merge(&status),
        )
        .await?;
        Ok(())
    }
}
