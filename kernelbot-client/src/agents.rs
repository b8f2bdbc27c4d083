//! Agent-related API endpoints

use kernelbot_core::dto::agent::Agent;

use crate::BuildkiteClient;
use crate::error::Result;

impl BuildkiteClient {
    /// List the organization's connected agents
    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        let url = format!("{}/agents", self.organization_url());
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
