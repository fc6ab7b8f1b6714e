use std::collections::HashMap;

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use huddle_db::models::{
    Channel, ChannelBan, ChannelKickVote, ChannelMember, DirectMessage, Message, ModelError, User,
    UserStatus,
};
use parking_lot::RwLock;

use super::ChatStore;
use crate::dao::base::{DaoError, DaoResult, PaginatedResult, PaginationParams};

type Pair = (ObjectId, ObjectId);

#[derive(Default)]
struct Tables {
    users: HashMap<ObjectId, User>,
    channels: HashMap<ObjectId, Channel>,
    members: HashMap<Pair, ChannelMember>,
    bans: HashMap<Pair, ChannelBan>,
    /// (channel, target) -> voter -> vote
    votes: HashMap<Pair, HashMap<ObjectId, ChannelKickVote>>,
    messages: HashMap<ObjectId, Message>,
    direct_messages: HashMap<ObjectId, DirectMessage>,
}

/// Single-process store. One lock over every table makes each call atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate(mut items: Vec<Message>, params: &PaginationParams) -> PaginatedResult<Message> {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    let total = items.len() as u64;
    let page: Vec<Message> = items
        .into_iter()
        .skip(usize::try_from(params.skip()).unwrap_or(usize::MAX))
        .take(usize::try_from(params.per_page).unwrap_or(usize::MAX))
        .collect();
    PaginatedResult::new(page, total, params)
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> DaoResult<()> {
        let mut t = self.tables.write();
        if t.users.values().any(|u| u.username == user.username) {
            return Err(DaoError::DuplicateKey(format!("username {}", user.username)));
        }
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: ObjectId) -> DaoResult<User> {
        self.tables.read().users.get(&id).cloned().ok_or(DaoError::NotFound)
    }

    async fn find_users_by_usernames(&self, usernames: &[String]) -> DaoResult<Vec<User>> {
        let t = self.tables.read();
        Ok(t.users
            .values()
            .filter(|u| usernames.contains(&u.username))
            .cloned()
            .collect())
    }

    async fn search_users(&self, query: &str, limit: usize) -> DaoResult<Vec<User>> {
        let needle = query.to_lowercase();
        let t = self.tables.read();
        let mut found: Vec<User> = t
            .users
            .values()
            .filter(|u| {
                u.username.to_lowercase().contains(&needle)
                    || u.first_name.to_lowercase().contains(&needle)
                    || u.last_name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        found.truncate(limit);
        Ok(found)
    }

    async fn update_user_status(&self, id: ObjectId, status: UserStatus) -> DaoResult<()> {
        let mut t = self.tables.write();
        let user = t.users.get_mut(&id).ok_or(DaoError::NotFound)?;
        user.status = status;
        user.updated_at = DateTime::now();
        Ok(())
    }

    async fn insert_channel(&self, channel: &Channel, owner: &ChannelMember) -> DaoResult<()> {
        let mut t = self.tables.write();
        if t.channels.values().any(|c| c.name_key == channel.name_key) {
            return Err(DaoError::DuplicateKey(format!("channel name {}", channel.name)));
        }
        t.channels.insert(channel.id, channel.clone());
        t.members.insert((channel.id, owner.user_id), owner.clone());
        Ok(())
    }

    async fn find_channel(&self, id: ObjectId) -> DaoResult<Channel> {
        self.tables.read().channels.get(&id).cloned().ok_or(DaoError::NotFound)
    }

    async fn find_channel_by_name(&self, name: &str) -> DaoResult<Option<Channel>> {
        let key = Channel::name_key(name);
        Ok(self
            .tables
            .read()
            .channels
            .values()
            .find(|c| c.name_key == key)
            .cloned())
    }

    async fn find_public_channels(&self) -> DaoResult<Vec<Channel>> {
        let t = self.tables.read();
        let mut channels: Vec<Channel> = t.channels.values().filter(|c| !c.is_private).cloned().collect();
        channels.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        Ok(channels)
    }

    async fn find_user_channels(&self, user_id: ObjectId) -> DaoResult<Vec<Channel>> {
        let t = self.tables.read();
        let mut channels: Vec<Channel> = t
            .members
            .keys()
            .filter(|(_, uid)| *uid == user_id)
            .filter_map(|(cid, _)| t.channels.get(cid).cloned())
            .collect();
        channels.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        Ok(channels)
    }

    async fn find_stale_channels(&self, cutoff: DateTime) -> DaoResult<Vec<Channel>> {
        let t = self.tables.read();
        Ok(t.channels.values().filter(|c| c.is_stale(cutoff)).cloned().collect())
    }

    async fn touch_channel(&self, id: ObjectId, at: DateTime) -> DaoResult<()> {
        let mut t = self.tables.write();
        let channel = t.channels.get_mut(&id).ok_or(DaoError::NotFound)?;
        channel.last_active_at = at;
        channel.updated_at = at;
        Ok(())
    }

    async fn delete_channel(&self, id: ObjectId) -> DaoResult<bool> {
        let mut t = self.tables.write();
        if t.channels.remove(&id).is_none() {
            return Ok(false);
        }
        t.members.retain(|(cid, _), _| *cid != id);
        t.bans.retain(|(cid, _), _| *cid != id);
        t.votes.retain(|(cid, _), _| *cid != id);
        t.messages.retain(|_, m| m.channel_id != Some(id));
        Ok(true)
    }

    async fn insert_member(&self, member: &ChannelMember, lift_ban: bool) -> DaoResult<()> {
        let key = (member.channel_id, member.user_id);
        let mut t = self.tables.write();
        if !t.channels.contains_key(&member.channel_id) {
            return Err(DaoError::NotFound);
        }
        if t.members.contains_key(&key) {
            return Err(DaoError::DuplicateKey("channel membership".to_string()));
        }
        if t.bans.contains_key(&key) {
            if !lift_ban {
                return Err(DaoError::Forbidden("user is banned from this channel".to_string()));
            }
            t.bans.remove(&key);
            t.votes.remove(&key);
        }
        t.members.insert(key, member.clone());
        Ok(())
    }

    async fn find_member(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<Option<ChannelMember>> {
        Ok(self.tables.read().members.get(&(channel_id, user_id)).cloned())
    }

    async fn find_members(&self, channel_id: ObjectId) -> DaoResult<Vec<ChannelMember>> {
        let t = self.tables.read();
        let mut members: Vec<ChannelMember> = t
            .members
            .values()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(members)
    }

    async fn delete_member(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<bool> {
        Ok(self.tables.write().members.remove(&(channel_id, user_id)).is_some())
    }

    async fn set_member_invited(&self, channel_id: ObjectId, user_id: ObjectId, invited: bool) -> DaoResult<bool> {
        let mut t = self.tables.write();
        match t.members.get_mut(&(channel_id, user_id)) {
            Some(member) => {
                member.is_invited = invited;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_ban(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<Option<ChannelBan>> {
        Ok(self.tables.read().bans.get(&(channel_id, user_id)).cloned())
    }

    async fn apply_ban(&self, ban: &ChannelBan) -> DaoResult<bool> {
        let key = (ban.channel_id, ban.user_id);
        let mut t = self.tables.write();
        let removed = t.members.remove(&key).is_some();
        let stored = match t.bans.remove(&key) {
            Some(existing) => ChannelBan {
                id: existing.id,
                created_at: existing.created_at,
                ..ban.clone()
            },
            None => ban.clone(),
        };
        t.bans.insert(key, stored);
        t.votes.remove(&key);
        Ok(removed)
    }

    async fn delete_ban(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<bool> {
        let key = (channel_id, user_id);
        let mut t = self.tables.write();
        t.votes.remove(&key);
        Ok(t.bans.remove(&key).is_some())
    }

    async fn upsert_vote(&self, vote: &ChannelKickVote) -> DaoResult<()> {
        let mut t = self.tables.write();
        t.votes
            .entry((vote.channel_id, vote.user_id))
            .or_default()
            .entry(vote.voted_by)
            .or_insert_with(|| vote.clone());
        Ok(())
    }

    async fn count_votes(&self, channel_id: ObjectId, user_id: ObjectId) -> DaoResult<u64> {
        Ok(self
            .tables
            .read()
            .votes
            .get(&(channel_id, user_id))
            .map_or(0, |v| v.len() as u64))
    }

    async fn insert_message(&self, message: &Message) -> DaoResult<()> {
        message.target()?;
        self.tables.write().messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn find_message(&self, id: ObjectId) -> DaoResult<Message> {
        self.tables.read().messages.get(&id).cloned().ok_or(DaoError::NotFound)
    }

    async fn delete_message(&self, id: ObjectId) -> DaoResult<bool> {
        Ok(self.tables.write().messages.remove(&id).is_some())
    }

    async fn find_channel_messages(
        &self,
        channel_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Message>> {
        let items = self
            .tables
            .read()
            .messages
            .values()
            .filter(|m| m.channel_id == Some(channel_id))
            .cloned()
            .collect();
        Ok(paginate(items, params))
    }

    async fn find_direct_messages(
        &self,
        direct_message_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Message>> {
        let items = self
            .tables
            .read()
            .messages
            .values()
            .filter(|m| m.direct_message_id == Some(direct_message_id))
            .cloned()
            .collect();
        Ok(paginate(items, params))
    }

    async fn insert_direct_message(&self, dm: &DirectMessage) -> DaoResult<()> {
        if !dm.is_canonical() {
            return Err(DaoError::Validation(ModelError::SelfConversation));
        }
        let mut t = self.tables.write();
        if t
            .direct_messages
            .values()
            .any(|d| d.user1_id == dm.user1_id && d.user2_id == dm.user2_id)
        {
            return Err(DaoError::DuplicateKey("direct message pair".to_string()));
        }
        t.direct_messages.insert(dm.id, dm.clone());
        Ok(())
    }

    async fn find_direct_message(&self, id: ObjectId) -> DaoResult<DirectMessage> {
        self.tables
            .read()
            .direct_messages
            .get(&id)
            .cloned()
            .ok_or(DaoError::NotFound)
    }

    async fn find_direct_message_by_pair(
        &self,
        user1_id: ObjectId,
        user2_id: ObjectId,
    ) -> DaoResult<Option<DirectMessage>> {
        Ok(self
            .tables
            .read()
            .direct_messages
            .values()
            .find(|d| d.user1_id == user1_id && d.user2_id == user2_id)
            .cloned())
    }

    async fn find_user_direct_messages(&self, user_id: ObjectId) -> DaoResult<Vec<DirectMessage>> {
        let t = self.tables.read();
        let mut dms: Vec<DirectMessage> = t
            .direct_messages
            .values()
            .filter(|d| d.has_participant(user_id))
            .cloned()
            .collect();
        dms.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(dms)
    }

    async fn touch_direct_message(&self, id: ObjectId, at: DateTime) -> DaoResult<()> {
        let mut t = self.tables.write();
        let dm = t.direct_messages.get_mut(&id).ok_or(DaoError::NotFound)?;
        dm.last_message_at = Some(at);
        dm.updated_at = at;
        Ok(())
    }
}
