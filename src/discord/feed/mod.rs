// Twitter feed relay: chat commands in, webhook posts out.

pub mod dispatcher;
pub mod help;
pub mod permissions;
pub mod presence;
pub mod router;
