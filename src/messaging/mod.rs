// Messaging - Commands to the audio thread, notifications to the front end

pub mod channels;
pub mod command;
pub mod notification;
