use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{
    Channel, ChannelBan, ChannelKickVote, ChannelMember, DirectMessage, Message, User,
};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        User::COLLECTION,
        vec![index_unique(bson::doc! { "username": 1 })],
    )
    .await?;

    // Channels
    create_indexes(
        db,
        Channel::COLLECTION,
        vec![
            index_unique(bson::doc! { "name_key": 1 }),
            index(bson::doc! { "last_active_at": 1 }),
            index(bson::doc! { "is_private": 1, "last_active_at": -1 }),
        ],
    )
    .await?;

    // Channel Members
    create_indexes(
        db,
        ChannelMember::COLLECTION,
        vec![
            index_unique(bson::doc! { "channel_id": 1, "user_id": 1 }),
            index(bson::doc! { "user_id": 1 }),
        ],
    )
    .await?;

    // Bans
    create_indexes(
        db,
        ChannelBan::COLLECTION,
        vec![index_unique(bson::doc! { "channel_id": 1, "user_id": 1 })],
    )
    .await?;

    // Kick votes
    create_indexes(
        db,
        ChannelKickVote::COLLECTION,
        vec![index_unique(
            bson::doc! { "channel_id": 1, "user_id": 1, "voted_by": 1 },
        )],
    )
    .await?;

    // Messages
    create_indexes(
        db,
        Message::COLLECTION,
        vec![
            index(bson::doc! { "channel_id": 1, "created_at": -1 }),
            index(bson::doc! { "direct_message_id": 1, "created_at": -1 }),
            index(bson::doc! { "mentions": 1 }),
        ],
    )
    .await?;

    // Direct messages
    create_indexes(
        db,
        DirectMessage::COLLECTION,
        vec![
            index_unique(bson::doc! { "user1_id": 1, "user2_id": 1 }),
            index(bson::doc! { "user2_id": 1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
