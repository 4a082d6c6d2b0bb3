mod message_service;
mod participant_service;

mod participant_service_tests;

pub use message_service::{
    EditMessageRequest, MessageService, MessageServiceDependencies, PostMessageRequest,
};
pub use participant_service::{ParticipantService, ParticipantServiceDependencies};
