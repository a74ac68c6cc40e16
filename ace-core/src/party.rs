//! Ownership of user-hosted voice channels ("parties").
//!
//! The state starts empty and is fed from voice state updates. A party whose
//! last occupant leaves is forgotten; when only one occupant is left, that
//! occupant becomes the owner.

use std::collections::{HashMap, HashSet};

use ace_utils::errors::{InteractionError, Precondition};
use tokio::sync::RwLock;
use tracing::debug;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, UserMarker},
};

type ChannelId = Id<ChannelMarker>;
type UserId = Id<UserMarker>;

/// A tracked party as seen by one of its occupants.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Party {
    pub channel_id: ChannelId,
    pub owner: UserId,
    pub occupants: usize,
}

/// Side effect of a voice state update on tracked parties.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PartyChange {
    /// The last occupant left; the party is no longer tracked.
    Emptied(ChannelId),
    OwnerChanged { channel_id: ChannelId, owner: UserId },
}

#[derive(Debug, Default)]
struct PartyState {
    owners: HashMap<ChannelId, UserId>,
    occupants: HashMap<ChannelId, HashSet<UserId>>,
    locations: HashMap<UserId, ChannelId>,
}

impl PartyState {
    fn party(&self, channel_id: ChannelId) -> Option<Party> {
        let owner = *self.owners.get(&channel_id)?;
        Some(Party {
            channel_id,
            owner,
            occupants: self.occupants.get(&channel_id).map_or(0, HashSet::len),
        })
    }
}

/// Explicit, process-wide party registry.
#[derive(Debug, Default)]
pub struct PartyChannels {
    state: RwLock<PartyState>,
}

impl PartyChannels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `user` to `channel` (or out of voice), returning what that did to parties.
    pub async fn voice_state_update(
        &self,
        user: UserId,
        channel: Option<ChannelId>,
    ) -> Option<PartyChange> {
        let mut state = self.state.write().await;

        let previous = match channel {
            Some(channel_id) => state.locations.insert(user, channel_id),
            None => state.locations.remove(&user),
        };
        if previous == channel {
            return None;
        }

        if let Some(channel_id) = channel {
            state.occupants.entry(channel_id).or_default().insert(user);
        }

        let left = previous?;
        let remaining = match state.occupants.get_mut(&left) {
            Some(occupants) => {
                occupants.remove(&user);
                occupants.iter().copied().collect::<Vec<_>>()
            }
            None => Vec::new(),
        };
        if remaining.is_empty() {
            state.occupants.remove(&left);
        }

        let owner = *state.owners.get(&left)?;
        match remaining.as_slice() {
            [] => {
                state.owners.remove(&left);
                debug!(channel_id = left.get(), "party emptied");
                Some(PartyChange::Emptied(left))
            }
            [last] if *last != owner => {
                state.owners.insert(left, *last);
                debug!(channel_id = left.get(), owner = last.get(), "party ownership moved");
                Some(PartyChange::OwnerChanged {
                    channel_id: left,
                    owner: *last,
                })
            }
            _ => None,
        }
    }

    /// Voice channel `user` is connected to, if any.
    pub async fn voice_channel_of(&self, user: UserId) -> Option<ChannelId> {
        self.state.read().await.locations.get(&user).copied()
    }

    pub async fn party(&self, channel_id: ChannelId) -> Option<Party> {
        self.state.read().await.party(channel_id)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.owners.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Party `user` is in, or the precondition they fail.
    pub async fn require_party(&self, user: UserId) -> Result<Party, InteractionError> {
        let state = self.state.read().await;
        let channel_id = state
            .locations
            .get(&user)
            .copied()
            .ok_or_else(|| InteractionError::precondition(Precondition::InVoiceChannel))?;

        state
            .party(channel_id)
            .ok_or_else(|| InteractionError::precondition(Precondition::InParty))
    }

    /// Turn the voice channel `user` is in into a party they own.
    pub async fn host(&self, user: UserId) -> Result<Party, InteractionError> {
        let mut state = self.state.write().await;
        let channel_id = state
            .locations
            .get(&user)
            .copied()
            .ok_or_else(|| InteractionError::precondition(Precondition::InVoiceChannel))?;

        if state.owners.contains_key(&channel_id) {
            return Err(InteractionError::precondition(Precondition::Custom(
                "This channel already is a party !".to_owned(),
            )));
        }

        state.owners.insert(channel_id, user);
        state.party(channel_id).ok_or_else(|| {
            InteractionError::unhandled(anyhow::anyhow!("party {channel_id} vanished while hosting"))
        })
    }

    /// Take over the party in `channel_id` once its owner has left the channel.
    ///
    /// `user` has to be inside that very channel.
    pub async fn claim(&self, user: UserId, channel_id: ChannelId) -> Result<Party, InteractionError> {
        let mut state = self.state.write().await;
        match state.locations.get(&user) {
            None => return Err(InteractionError::precondition(Precondition::InVoiceChannel)),
            Some(current) if *current != channel_id => {
                return Err(InteractionError::precondition(Precondition::InParty));
            }
            Some(_) => {}
        }
        let owner = *state
            .owners
            .get(&channel_id)
            .ok_or_else(|| InteractionError::precondition(Precondition::InParty))?;

        if owner == user {
            return Err(InteractionError::precondition(Precondition::Custom(
                "You already own this party !".to_owned(),
            )));
        }
        let owner_present = state
            .occupants
            .get(&channel_id)
            .is_some_and(|occupants| occupants.contains(&owner));
        if owner_present {
            return Err(InteractionError::precondition(Precondition::PartyOwner));
        }

        state.owners.insert(channel_id, user);
        state.party(channel_id).ok_or_else(|| {
            InteractionError::unhandled(anyhow::anyhow!("party {channel_id} vanished while claiming"))
        })
    }
}
