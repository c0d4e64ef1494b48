use sea_orm::{DatabaseTransaction, prelude::*, sea_query::OnConflict};

use crate::{EngineError, ResultEngine, counters};

/// Draw the next value of the named counter inside the caller's transaction.
///
/// The first draw returns 1. The increment rolls back with the transaction.
pub(super) async fn next_sequence(db_tx: &DatabaseTransaction, name: &str) -> ResultEngine<i64> {
    let failed = |err: DbErr| {
        tracing::error!(sequence = name, %err, "sequence increment failed");
        EngineError::Sequence(name.replace('_', " "))
    };

    let seed = counters::ActiveModel {
        name: sea_orm::ActiveValue::Set(name.to_string()),
        value: sea_orm::ActiveValue::Set(1),
    };
    counters::Entity::insert(seed)
        .on_conflict(
            OnConflict::column(counters::Column::Name)
                .value(
                    counters::Column::Value,
                    Expr::col(counters::Column::Value).add(1),
                )
                .to_owned(),
        )
        .exec_without_returning(db_tx)
        .await
        .map_err(failed)?;

    let counter = counters::Entity::find_by_id(name.to_string())
        .one(db_tx)
        .await
        .map_err(failed)?
        .ok_or_else(|| EngineError::Sequence(name.replace('_', " ")))?;
    Ok(counter.value)
}

#[cfg(test)]
mod tests {
    use sea_orm::{Database, TransactionTrait};

    use super::*;

    async fn db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.execute_unprepared("CREATE TABLE counters (name TEXT PRIMARY KEY NOT NULL, value BIGINT NOT NULL)")
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn counters_start_at_one_and_are_independent() {
        let db = db().await;
        let tx = db.begin().await.unwrap();
        assert_eq!(next_sequence(&tx, "invoice").await.unwrap(), 1);
        assert_eq!(next_sequence(&tx, "invoice").await.unwrap(), 2);
        assert_eq!(next_sequence(&tx, "sales_order").await.unwrap(), 1);
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn aborted_draw_is_rolled_back() {
        let db = db().await;
        let tx = db.begin().await.unwrap();
        assert_eq!(next_sequence(&tx, "invoice").await.unwrap(), 1);
        tx.rollback().await.unwrap();

        let tx = db.begin().await.unwrap();
        assert_eq!(next_sequence(&tx, "invoice").await.unwrap(), 1);
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn missing_table_maps_to_sequence_error() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let tx = db.begin().await.unwrap();
        let err = next_sequence(&tx, "sales_order").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to generate sales order number");
    }
}
