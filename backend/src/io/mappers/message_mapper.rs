use shared::{ConversationResponse, Message as DtoMessage, SendMessageRequest};

use super::donation_mapper::DonationMapper;
use crate::domain::commands::conversations::SendMessageCommand;
use crate::domain::models::message::{ConversationId, Message};
use crate::domain::ConversationHistory;

pub struct MessageMapper;

impl MessageMapper {
    pub fn to_dto(message: Message) -> DtoMessage {
        DtoMessage {
            id: message.id,
            conversation_id: message.conversation.to_string(),
            sequence: message.sequence,
            text: message.text,
            sender: DonationMapper::user_to_dto(message.sender),
            timestamp: message.timestamp.to_rfc3339(),
        }
    }

    pub fn history_to_dto(history: ConversationHistory) -> ConversationResponse {
        let conversation_id = history.conversation().to_string();
        ConversationResponse {
            conversation_id,
            messages: history.into_messages().into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn send_request_to_command(request: SendMessageRequest) -> SendMessageCommand {
        SendMessageCommand {
            conversation: ConversationId::from_raw(request.conversation_id),
            text: request.text,
        }
    }
}
