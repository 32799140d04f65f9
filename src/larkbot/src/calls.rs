//! Chat commands exposed to Lark users.
//!
//! Two command objects exist. [`Call`] is what everybody gets and only
//! answers identity questions. [`MastersCall`] adds chat administration and
//! is handed to configured masters (or to everyone when no master is
//! configured). Each is built fresh for every incoming message.

use std::sync::Arc;

use futures::FutureExt;
use larkbot_calls::{
    Arguments, CommandObject, Operation, ParamType, Reply, Signature, Tag, call, describe,
    immediate, tag_type,
};
use tracing::{error, info};

use crate::api::ChatApi;
use crate::config::LarkConfig;
use crate::messages::{format_chats, format_users};

tag_type! {
    /// Display name of a chat.
    pub struct ChatName;
    /// Chat id (`oc_...`).
    pub struct ChatId;
    /// User open id (`ou_...`).
    pub struct UserId;
}

/// Reply of `WhosYourDaddy` when no master is configured.
pub const NO_MASTERS: &str = "nobody";

/// Who sent a command and where it was sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    /// Sender's open id.
    pub sender: String,
    /// Chat the command was posted in.
    pub chat_id: String,
}

impl CallContext {
    /// Create a context.
    pub fn new(sender: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            chat_id: chat_id.into(),
        }
    }
}

/// Commands available to every user.
pub struct Call {
    api: Arc<dyn ChatApi>,
    context: CallContext,
    masters: Vec<String>,
}

impl Call {
    /// Create the restricted command object for one message.
    pub fn new(api: Arc<dyn ChatApi>, context: CallContext, masters: Vec<String>) -> Self {
        Self {
            api,
            context,
            masters,
        }
    }

    /// The sender's open id.
    pub fn who_am_i(&self) -> String {
        self.context.sender.clone()
    }

    /// Profiles of the configured masters.
    pub async fn whos_your_daddy(&self) -> String {
        if self.masters.is_empty() {
            return NO_MASTERS.to_string();
        }

        match self.api.user_info(&self.masters).await {
            Ok(users) => format_users(&users),
            Err(e) => {
                error!("Failed to fetch masters: {}", e);
                e.to_string()
            }
        }
    }
}

const CHAT_NAME: ParamType = ParamType::single::<ChatName>();
const CHAT_ID: ParamType = ParamType::single::<ChatId>();
const CHAT_IDS: ParamType = ParamType::sequence::<ChatId>();
const USER_IDS: ParamType = ParamType::sequence::<UserId>();

fn call_who_am_i(call: &Call, _: Arguments) -> Reply<'_> {
    immediate(call.who_am_i())
}

fn call_whos_your_daddy(call: &Call, _: Arguments) -> Reply<'_> {
    call.whos_your_daddy().boxed()
}

fn call_help(_: &Call, _: Arguments) -> Reply<'_> {
    immediate(describe::<Call>())
}

static CALL_OPERATIONS: &[Operation<Call>] = &[
    Operation::new(Signature::fixed("Help", &[]), call_help),
    Operation::new(Signature::fixed("WhoAmI", &[]), call_who_am_i),
    Operation::new(Signature::fixed("WhosYourDaddy", &[]), call_whos_your_daddy),
];

impl CommandObject for Call {
    fn operations() -> &'static [Operation<Self>] {
        CALL_OPERATIONS
    }
}

/// Commands available to masters: everything in [`Call`] plus chat
/// administration.
pub struct MastersCall {
    call: Call,
}

impl MastersCall {
    /// Create the privileged command object for one message.
    pub fn new(api: Arc<dyn ChatApi>, context: CallContext, masters: Vec<String>) -> Self {
        Self {
            call: Call::new(api, context, masters),
        }
    }

    fn api(&self) -> &dyn ChatApi {
        self.call.api.as_ref()
    }

    fn sender(&self) -> &str {
        &self.call.context.sender
    }

    /// Add users to a chat.
    pub async fn add(&self, chat_id: ChatId, user_ids: Vec<UserId>) -> String {
        if chat_id.is_empty() || user_ids.is_empty() {
            return "chat id is needed to add users to a chat, specify like this:\n\
                    add(chat-id, user-id...)"
                .to_string();
        }

        let user_ids: Vec<String> = user_ids.into_iter().map(String::from).collect();
        match self.api().add_users_to_chat(chat_id.as_str(), &user_ids).await {
            Ok(()) => {
                info!("Added {} users to chat {}", user_ids.len(), chat_id);
                "successfully added users to chat".to_string()
            }
            Err(e) => {
                error!("Failed to add users to chat {}: {}", chat_id, e);
                e.to_string()
            }
        }
    }

    /// Create a chat owned by the sender.
    pub async fn create(&self, name: ChatName) -> String {
        if name.is_empty() {
            return "name is needed to create a chat, specify like this:\ncreate(name)"
                .to_string();
        }

        match self.api().create_chat(name.as_str(), self.sender()).await {
            Ok(chat_id) => {
                info!("Created chat {} ({})", name, chat_id);
                format!(
                    "chat with name \"{}\" has been created, its id is {}",
                    name, chat_id
                )
            }
            Err(e) => {
                error!("Failed to create chat {}: {}", name, e);
                e.to_string()
            }
        }
    }

    /// Disband chats, reporting each one on its own line.
    pub async fn destroy(&self, chat_ids: Vec<ChatId>) -> String {
        if chat_ids.first().is_none_or(ChatId::is_empty) {
            return "chat id is needed to destroy a chat, specify like this:\n\
                    destroy(chat-id...)"
                .to_string();
        }

        let mut lines = Vec::with_capacity(chat_ids.len());
        for chat_id in &chat_ids {
            match self.api().destroy_chat(chat_id.as_str()).await {
                Ok(()) => {
                    info!("Destroyed chat {}", chat_id);
                    lines.push(format!("successfully destroyed chat: {}", chat_id));
                }
                Err(e) => {
                    error!("Failed to destroy chat {}: {}", chat_id, e);
                    lines.push(e.to_string());
                }
            }
        }
        lines.join("\n")
    }

    /// Add the sender to chats, reporting each one on its own line.
    pub async fn join(&self, chat_ids: Vec<ChatId>) -> String {
        if chat_ids.first().is_none_or(ChatId::is_empty) {
            return "chat id is needed to join a chat, specify like this:\n\
                    join(chat-id...)"
                .to_string();
        }

        let sender = vec![self.sender().to_string()];
        let mut lines = Vec::with_capacity(chat_ids.len());
        for chat_id in &chat_ids {
            match self.api().add_users_to_chat(chat_id.as_str(), &sender).await {
                Ok(()) => lines.push(format!("successfully joined chat: {}", chat_id)),
                Err(e) => {
                    error!("Failed to join chat {}: {}", chat_id, e);
                    lines.push(e.to_string());
                }
            }
        }
        lines.join("\n")
    }

    /// List every chat the bot is in.
    pub async fn list(&self) -> String {
        match self.api().list_chats().await {
            Ok(chats) => format_chats(&chats),
            Err(e) => {
                error!("Failed to list chats: {}", e);
                e.to_string()
            }
        }
    }

    /// List the members of a chat.
    pub async fn members(&self, chat_id: ChatId) -> String {
        if chat_id.is_empty() {
            return "chat id is needed to list members of a chat, specify like this:\n\
                    members(chat-id)"
                .to_string();
        }

        let info = match self.api().chat_info(chat_id.as_str()).await {
            Ok(info) => info,
            Err(e) => {
                error!("Failed to fetch chat {}: {}", chat_id, e);
                return e.to_string();
            }
        };

        match self.api().user_info(&info.member_ids()).await {
            Ok(users) => format_users(&users),
            Err(e) => {
                error!("Failed to fetch members of chat {}: {}", chat_id, e);
                e.to_string()
            }
        }
    }

    /// Remove users from a chat.
    pub async fn remove(&self, chat_id: ChatId, user_ids: Vec<UserId>) -> String {
        if chat_id.is_empty() || user_ids.is_empty() {
            return "chat id is needed to remove users from a chat, specify like this:\n\
                    remove(chat-id, user-id...)"
                .to_string();
        }

        let user_ids: Vec<String> = user_ids.into_iter().map(String::from).collect();
        match self
            .api()
            .remove_users_from_chat(chat_id.as_str(), &user_ids)
            .await
        {
            Ok(()) => {
                info!("Removed {} users from chat {}", user_ids.len(), chat_id);
                "successfully removed users from chat".to_string()
            }
            Err(e) => {
                error!("Failed to remove users from chat {}: {}", chat_id, e);
                e.to_string()
            }
        }
    }
}

fn masters_add(call: &MastersCall, mut args: Arguments) -> Reply<'_> {
    let chat_id = args.single();
    let user_ids = args.sequence();
    call.add(chat_id, user_ids).boxed()
}

fn masters_create(call: &MastersCall, mut args: Arguments) -> Reply<'_> {
    call.create(args.single()).boxed()
}

fn masters_destroy(call: &MastersCall, mut args: Arguments) -> Reply<'_> {
    call.destroy(args.sequence()).boxed()
}

fn masters_help(_: &MastersCall, _: Arguments) -> Reply<'_> {
    immediate(describe::<MastersCall>())
}

fn masters_join(call: &MastersCall, mut args: Arguments) -> Reply<'_> {
    call.join(args.sequence()).boxed()
}

fn masters_list(call: &MastersCall, _: Arguments) -> Reply<'_> {
    call.list().boxed()
}

fn masters_members(call: &MastersCall, mut args: Arguments) -> Reply<'_> {
    call.members(args.single()).boxed()
}

fn masters_remove(call: &MastersCall, mut args: Arguments) -> Reply<'_> {
    let chat_id = args.single();
    let user_ids = args.sequence();
    call.remove(chat_id, user_ids).boxed()
}

fn masters_who_am_i(call: &MastersCall, _: Arguments) -> Reply<'_> {
    immediate(call.call.who_am_i())
}

fn masters_whos_your_daddy(call: &MastersCall, _: Arguments) -> Reply<'_> {
    call.call.whos_your_daddy().boxed()
}

static MASTERS_OPERATIONS: &[Operation<MastersCall>] = &[
    Operation::new(Signature::variadic("Add", &[CHAT_ID, USER_IDS]), masters_add),
    Operation::new(Signature::fixed("Create", &[CHAT_NAME]), masters_create),
    Operation::new(Signature::variadic("Destroy", &[CHAT_IDS]), masters_destroy),
    Operation::new(Signature::fixed("Help", &[]), masters_help),
    Operation::new(Signature::variadic("Join", &[CHAT_IDS]), masters_join),
    Operation::new(Signature::fixed("List", &[]), masters_list),
    Operation::new(Signature::fixed("Members", &[CHAT_ID]), masters_members),
    Operation::new(Signature::variadic("Remove", &[CHAT_ID, USER_IDS]), masters_remove),
    Operation::new(Signature::fixed("WhoAmI", &[]), masters_who_am_i),
    Operation::new(Signature::fixed("WhosYourDaddy", &[]), masters_whos_your_daddy),
];

impl CommandObject for MastersCall {
    fn operations() -> &'static [Operation<Self>] {
        MASTERS_OPERATIONS
    }
}

/// Run one command for `context.sender` and return the reply text.
///
/// Masters get [`MastersCall`], everybody else gets [`Call`].
pub async fn respond(
    api: Arc<dyn ChatApi>,
    config: &LarkConfig,
    context: CallContext,
    text: &str,
) -> String {
    let masters = config.masters().to_vec();

    if config.is_master(&context.sender) {
        call(&MastersCall::new(api, context, masters), text).await
    } else {
        call(&Call::new(api, context, masters), text).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::api::{ChatInfo, ChatMember, ChatSummary, UserInfo};
    use crate::error::{LarkError, LarkResult};

    /// In-memory API recording every call.
    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<String>>,
        /// Chat ids whose operations fail.
        broken: Vec<String>,
    }

    impl FakeApi {
        fn broken(ids: &[&str]) -> Self {
            Self {
                broken: ids.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        fn record(&self, entry: String, chat_id: &str) -> LarkResult<()> {
            self.calls.lock().unwrap().push(entry);
            if self.broken.iter().any(|id| id == chat_id) {
                return Err(LarkError::Api(format!("90003: no access to {}", chat_id)));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatApi for FakeApi {
        async fn create_chat(&self, name: &str, owner_open_id: &str) -> LarkResult<String> {
            self.record(format!("create {} {}", name, owner_open_id), name)?;
            Ok("oc_new".to_string())
        }

        async fn add_users_to_chat(&self, chat_id: &str, open_ids: &[String]) -> LarkResult<()> {
            self.record(format!("add {} {}", chat_id, open_ids.join(",")), chat_id)
        }

        async fn remove_users_from_chat(
            &self,
            chat_id: &str,
            open_ids: &[String],
        ) -> LarkResult<()> {
            self.record(format!("remove {} {}", chat_id, open_ids.join(",")), chat_id)
        }

        async fn destroy_chat(&self, chat_id: &str) -> LarkResult<()> {
            self.record(format!("destroy {}", chat_id), chat_id)
        }

        async fn chat_info(&self, chat_id: &str) -> LarkResult<ChatInfo> {
            self.record(format!("info {}", chat_id), chat_id)?;
            Ok(ChatInfo {
                chat_id: chat_id.to_string(),
                members: vec![
                    ChatMember {
                        open_id: "ou_a".into(),
                        ..Default::default()
                    },
                    ChatMember {
                        open_id: "ou_b".into(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            })
        }

        async fn list_chats(&self) -> LarkResult<Vec<ChatSummary>> {
            self.record("list".to_string(), "")?;
            Ok(vec![
                ChatSummary {
                    chat_id: "oc_1".into(),
                    name: "ops".into(),
                    ..Default::default()
                },
                ChatSummary {
                    chat_id: "oc_2".into(),
                    name: "dev".into(),
                    ..Default::default()
                },
            ])
        }

        async fn user_info(&self, open_ids: &[String]) -> LarkResult<Vec<UserInfo>> {
            self.record(format!("users {}", open_ids.join(",")), "")?;
            Ok(open_ids
                .iter()
                .map(|id| UserInfo {
                    open_id: id.clone(),
                    name: id.trim_start_matches("ou_").to_uppercase(),
                    ..Default::default()
                })
                .collect())
        }
    }

    fn masters_call(api: &Arc<FakeApi>) -> MastersCall {
        MastersCall::new(
            api.clone(),
            CallContext::new("ou_me", "oc_here"),
            vec!["ou_me".to_string()],
        )
    }

    #[tokio::test]
    async fn test_masters_help() {
        let api = Arc::new(FakeApi::default());
        let expected = [
            "Add(ChatId, UserId...)",
            "Create(ChatName)",
            "Destroy(ChatId...)",
            "Help()",
            "Join(ChatId...)",
            "List()",
            "Members(ChatId)",
            "Remove(ChatId, UserId...)",
            "WhoAmI()",
            "WhosYourDaddy()",
        ]
        .join("\n");

        assert_eq!(call(&masters_call(&api), "help").await, expected);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_restricted_help_and_identity() {
        let api = Arc::new(FakeApi::default());
        let restricted = Call::new(api.clone(), CallContext::new("ou_x", "oc_1"), vec![]);

        assert_eq!(
            call(&restricted, "Help()").await,
            "Help()\nWhoAmI()\nWhosYourDaddy()"
        );
        assert_eq!(call(&restricted, "whoami").await, "ou_x");
        assert_eq!(call(&restricted, "whosyourdaddy").await, NO_MASTERS);
        assert_eq!(call(&restricted, "list()").await, "unknown function");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_whos_your_daddy_lists_masters() {
        let api = Arc::new(FakeApi::default());
        let restricted = Call::new(
            api.clone(),
            CallContext::new("ou_x", "oc_1"),
            vec!["ou_boss".to_string()],
        );

        assert_eq!(call(&restricted, "WhosYourDaddy").await, "BOSS (ou_boss)");
        assert_eq!(api.calls(), vec!["users ou_boss"]);
    }

    #[tokio::test]
    async fn test_add_variadic() {
        let api = Arc::new(FakeApi::default());
        let object = masters_call(&api);

        assert_eq!(
            call(&object, "add(c1, u1, u2, u3)").await,
            "successfully added users to chat"
        );
        assert_eq!(api.calls(), vec!["add c1 u1,u2,u3"]);

        assert_eq!(
            call(&object, "add(c1)").await,
            "chat id is needed to add users to a chat, specify like this:\nadd(chat-id, user-id...)"
        );
        assert_eq!(call(&object, "add()").await, "too few arguments");
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_list_takes_no_arguments() {
        let api = Arc::new(FakeApi::default());
        let object = masters_call(&api);

        assert_eq!(call(&object, "list").await, "ops (oc_1)\ndev (oc_2)");
        assert_eq!(call(&object, "LIST()").await, "ops (oc_1)\ndev (oc_2)");
        assert_eq!(call(&object, "list(x)").await, "too many arguments");
        assert_eq!(api.calls(), vec!["list", "list"]);
    }

    #[tokio::test]
    async fn test_create() {
        let api = Arc::new(FakeApi::default());
        let object = masters_call(&api);

        assert_eq!(
            call(&object, "create(ops)").await,
            "chat with name \"ops\" has been created, its id is oc_new"
        );
        assert_eq!(api.calls(), vec!["create ops ou_me"]);

        assert_eq!(call(&object, "create( )").await, "too few arguments");
        assert_eq!(call(&object, "create(,)").await, "too many arguments");
        assert_eq!(call(&object, "create(my team)").await, "unknown expression");
        assert_eq!(api.calls(), vec!["create ops ou_me"]);
    }

    #[tokio::test]
    async fn test_create_empty_name() {
        let api = Arc::new(FakeApi::default());
        let object = masters_call(&api);

        assert_eq!(
            object.create(ChatName::default()).await,
            "name is needed to create a chat, specify like this:\ncreate(name)"
        );
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_destroy_reports_each_chat() {
        let api = Arc::new(FakeApi::broken(&["oc_bad"]));
        let object = masters_call(&api);

        assert_eq!(
            call(&object, "destroy(oc_1, oc_bad, oc_2)").await,
            "successfully destroyed chat: oc_1\n\
             Lark API error: 90003: no access to oc_bad\n\
             successfully destroyed chat: oc_2"
        );
        assert_eq!(
            api.calls(),
            vec!["destroy oc_1", "destroy oc_bad", "destroy oc_2"]
        );

        assert_eq!(
            call(&object, "destroy()").await,
            "chat id is needed to destroy a chat, specify like this:\ndestroy(chat-id...)"
        );
    }

    #[tokio::test]
    async fn test_join_adds_sender() {
        let api = Arc::new(FakeApi::default());
        let object = masters_call(&api);

        assert_eq!(
            call(&object, "join(oc_1, oc_2)").await,
            "successfully joined chat: oc_1\nsuccessfully joined chat: oc_2"
        );
        assert_eq!(api.calls(), vec!["add oc_1 ou_me", "add oc_2 ou_me"]);

        assert_eq!(
            call(&object, "join(, oc_1)").await,
            "chat id is needed to join a chat, specify like this:\njoin(chat-id...)"
        );
    }

    #[tokio::test]
    async fn test_members() {
        let api = Arc::new(FakeApi::default());
        let object = masters_call(&api);

        assert_eq!(call(&object, "members(oc_1)").await, "A (ou_a)\nB (ou_b)");
        assert_eq!(api.calls(), vec!["info oc_1", "users ou_a,ou_b"]);

        assert_eq!(
            object.members(ChatId::default()).await,
            "chat id is needed to list members of a chat, specify like this:\nmembers(chat-id)"
        );
    }

    #[tokio::test]
    async fn test_members_api_failure() {
        let api = Arc::new(FakeApi::broken(&["oc_bad"]));
        let object = masters_call(&api);

        assert_eq!(
            call(&object, "members(oc_bad)").await,
            "Lark API error: 90003: no access to oc_bad"
        );
    }

    #[tokio::test]
    async fn test_remove() {
        let api = Arc::new(FakeApi::default());
        let object = masters_call(&api);

        assert_eq!(
            call(&object, "Remove(oc_1, ou_a)").await,
            "successfully removed users from chat"
        );
        assert_eq!(api.calls(), vec!["remove oc_1 ou_a"]);

        assert_eq!(
            call(&object, "remove(oc_1)").await,
            "chat id is needed to remove users from a chat, specify like this:\nremove(chat-id, user-id...)"
        );
    }

    #[tokio::test]
    async fn test_respond_picks_object_by_role() {
        let api = Arc::new(FakeApi::default());
        let config = LarkConfig::new("id", "secret").with_masters("ou_boss");

        let reply = respond(
            api.clone(),
            &config,
            CallContext::new("ou_guest", "oc_1"),
            "list",
        )
        .await;
        assert_eq!(reply, "unknown function");

        let reply = respond(
            api.clone(),
            &config,
            CallContext::new("ou_boss", "oc_1"),
            "list",
        )
        .await;
        assert_eq!(reply, "ops (oc_1)\ndev (oc_2)");

        let everyone = LarkConfig::new("id", "secret");
        let reply = respond(api, &everyone, CallContext::new("ou_guest", "oc_1"), "whoami").await;
        assert_eq!(reply, "ou_guest");
    }
}
