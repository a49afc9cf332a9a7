//! Server endpoints as seen from a conversation session

use async_trait::async_trait;

use crate::api::{AssistantReply, AssistantRequest, ChatRelayRequest};
use crate::Result;

#[async_trait]
pub trait AssistantGateway: Send + Sync + 'static {
    /// Call the completion endpoint once
    async fn send_message(&self, request: &AssistantRequest) -> Result<AssistantReply>;

    /// Post a message to the live-chat relay endpoint
    async fn relay_chat(&self, request: &ChatRelayRequest) -> Result<()>;
}
