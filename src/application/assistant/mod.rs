mod chat;

pub use chat::{clean_reply, stats_summary, ChatService, ReplyGenerator, StatContext, StatsReplyGenerator};
