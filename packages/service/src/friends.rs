//! Friend operations over a [`GraphStore`].
//!
//! [`FriendGraph`] is the layer handlers call. Reads are single-hop
//! traversals from one user; every lifecycle step is one atomic edge batch
//! taken from [`Transition::edge_ops`], so a request that does not fit the
//! current state fails without touching the graph.

use std::sync::Arc;

use friendgraph::{
    Direction, EdgePresence, FriendState, Node, NodeTemplate, Page, Properties, RelType,
    Transition, USER_ID_KEY, USER_LABEL,
};

use crate::storage::{GraphError, GraphStore};

#[derive(Debug, thiserror::Error)]
pub enum FriendError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("user {0:?} cannot befriend themselves")]
    SelfRelationship(String),

    #[error("user_id must not be empty")]
    EmptyUserId,
}

/// Shared handle to the friend graph; cheap to clone.
#[derive(Clone)]
pub struct FriendGraph {
    store: Arc<dyn GraphStore>,
}

impl FriendGraph {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    // --- Reads ---------------------------------------------------------------

    /// Users `user` is friends with.
    pub async fn get_friends(&self, user: &str, page: Page) -> Result<Vec<String>, FriendError> {
        self.neighbor_ids(user, RelType::Friend, Direction::Outgoing, page)
            .await
    }

    /// Users who have sent `user` a request.
    pub async fn get_pending_friends(
        &self,
        user: &str,
        page: Page,
    ) -> Result<Vec<String>, FriendError> {
        self.neighbor_ids(user, RelType::PendingFriend, Direction::Incoming, page)
            .await
    }

    /// Users `user` has sent a request to.
    pub async fn get_pending_friends_request(
        &self,
        user: &str,
        page: Page,
    ) -> Result<Vec<String>, FriendError> {
        self.neighbor_ids(user, RelType::PendingFriend, Direction::Outgoing, page)
            .await
    }

    async fn neighbor_ids(
        &self,
        user: &str,
        rel_type: RelType,
        direction: Direction,
        page: Page,
    ) -> Result<Vec<String>, FriendError> {
        let user = non_empty(user)?;
        let nodes = self
            .store
            .neighbors(&NodeTemplate::user(user), rel_type, direction, page)
            .await?;
        Ok(nodes
            .iter()
            .filter_map(|n| n.user_id().map(str::to_string))
            .collect())
    }

    /// Where `friend` stands relative to `user`.
    pub async fn relationship_state(
        &self,
        user: &str,
        friend: &str,
    ) -> Result<FriendState, FriendError> {
        let (user, friend) = distinct_pair(user, friend)?;
        let (u, f) = (NodeTemplate::user(user), NodeTemplate::user(friend));

        let presence: EdgePresence = self.store.edges_between(&u, &f).await?.into_iter().collect();
        Ok(FriendState::classify(presence))
    }

    // --- Lifecycle -----------------------------------------------------------

    pub async fn add_friend_request(&self, user: &str, friend: &str) -> Result<(), FriendError> {
        self.transition(Transition::Add, user, friend).await
    }

    pub async fn cancel_friend_request(&self, user: &str, friend: &str) -> Result<(), FriendError> {
        self.transition(Transition::Cancel, user, friend).await
    }

    /// `user` accepts the request `friend` sent them.
    pub async fn accept_friend_request(&self, user: &str, friend: &str) -> Result<(), FriendError> {
        self.transition(Transition::Accept, user, friend).await
    }

    pub async fn decline_friend_request(
        &self,
        user: &str,
        friend: &str,
    ) -> Result<(), FriendError> {
        self.transition(Transition::Decline, user, friend).await
    }

    pub async fn delete_friend(&self, user: &str, friend: &str) -> Result<(), FriendError> {
        self.transition(Transition::Remove, user, friend).await
    }

    /// Run one lifecycle step as a single store batch.
    pub async fn transition(
        &self,
        transition: Transition,
        user: &str,
        friend: &str,
    ) -> Result<(), FriendError> {
        let (user, friend) = distinct_pair(user, friend)?;
        self.store.apply(&transition.edge_ops(user, friend)).await?;
        tracing::debug!(%transition, user, friend, "transition applied");
        Ok(())
    }

    // --- Users ---------------------------------------------------------------

    pub async fn insert_user(&self, user_id: &str) -> Result<Node, FriendError> {
        let user_id = non_empty(user_id)?;
        let properties = Properties::from([(USER_ID_KEY.to_string(), user_id.to_string())]);
        Ok(self.store.create_node(USER_LABEL, &properties).await?)
    }

    /// Remove a user and every edge touching them. `None` if no such user.
    pub async fn delete_user(&self, user_id: &str) -> Result<Option<usize>, FriendError> {
        let user_id = non_empty(user_id)?;
        Ok(self.store.delete_nodes(&NodeTemplate::user(user_id)).await?)
    }
}

fn non_empty(user_id: &str) -> Result<&str, FriendError> {
    if user_id.is_empty() {
        return Err(FriendError::EmptyUserId);
    }
    Ok(user_id)
}

fn distinct_pair<'a>(user: &'a str, friend: &'a str) -> Result<(&'a str, &'a str), FriendError> {
    let (user, friend) = (non_empty(user)?, non_empty(friend)?);
    if user == friend {
        return Err(FriendError::SelfRelationship(user.to_string()));
    }
    Ok((user, friend))
}
