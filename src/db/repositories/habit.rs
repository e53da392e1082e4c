use anyhow::{Context, Result};
use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};

use crate::domain::{HabitDraft, HabitId, UserId};
use crate::entities::{habits, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Habit {
    pub id: HabitId,
    pub owner_id: UserId,
    pub place: String,
    pub time: NaiveTime,
    pub action: String,
    pub is_pleasant: bool,
    pub linked_id: Option<HabitId>,
    pub period: i32,
    pub reward: Option<String>,
    pub length: i32,
    pub is_public: bool,
    pub last_dispatch_time: Option<DateTime<Utc>>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<habits::Model> for Habit {
    fn from(m: habits::Model) -> Self {
        Self {
            id: HabitId::new(m.id),
            owner_id: UserId::new(m.owner_id),
            place: m.place,
            time: m.time,
            action: m.action,
            is_pleasant: m.is_pleasant,
            linked_id: m.linked_id.map(HabitId::new),
            period: m.period,
            reward: m.reward,
            length: m.length,
            is_public: m.is_public,
            last_dispatch_time: m.last_dispatch_time,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone)]
pub struct HabitPage {
    pub items: Vec<Habit>,
    pub total: u64,
    pub total_pages: u64,
}

/// Repository for habit operations
pub struct HabitRepository {
    conn: DatabaseConnection,
}

impl HabitRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn apply_draft(active: &mut habits::ActiveModel, draft: &HabitDraft) {
        active.place = Set(draft.place.clone());
        active.time = Set(draft.time);
        active.action = Set(draft.action.clone());
        active.is_pleasant = Set(draft.is_pleasant);
        active.linked_id = Set(draft.linked.map(|l| l.id.value()));
        active.period = Set(draft.period);
        active.reward = Set(draft.reward().map(ToString::to_string));
        active.length = Set(draft.length);
        active.is_public = Set(draft.is_public);
    }

    pub async fn insert(&self, owner: UserId, draft: &HabitDraft) -> Result<Habit> {
        let now = Utc::now().to_rfc3339();

        let mut active = habits::ActiveModel {
            owner_id: Set(owner.value()),
            last_dispatch_time: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };
        Self::apply_draft(&mut active, draft);

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert habit")?;

        Ok(Habit::from(model))
    }

    pub async fn get(&self, id: HabitId) -> Result<Option<Habit>> {
        let row = Habits::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query habit")?;

        Ok(row.map(Habit::from))
    }

    pub async fn list_for_owner(&self, owner: UserId, page: u64, page_size: u64) -> Result<HabitPage> {
        let paginator = Habits::find()
            .filter(habits::Column::OwnerId.eq(owner.value()))
            .order_by_asc(habits::Column::Id)
            .paginate(&self.conn, page_size);

        let totals = paginator.num_items_and_pages().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(HabitPage {
            items: items.into_iter().map(Habit::from).collect(),
            total: totals.number_of_items,
            total_pages: totals.number_of_pages,
        })
    }

    pub async fn list_public(&self) -> Result<Vec<Habit>> {
        let rows = Habits::find()
            .filter(habits::Column::IsPublic.eq(true))
            .order_by_asc(habits::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list public habits")?;

        Ok(rows.into_iter().map(Habit::from).collect())
    }

    pub async fn list_all(&self) -> Result<Vec<Habit>> {
        let rows = Habits::find()
            .order_by_asc(habits::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list habits")?;

        Ok(rows.into_iter().map(Habit::from).collect())
    }

    pub async fn count_linking_to(&self, id: HabitId) -> Result<u64> {
        Habits::find()
            .filter(habits::Column::LinkedId.eq(id.value()))
            .count(&self.conn)
            .await
            .context("Failed to count linked habits")
    }

    /// Overwrites every writable column with the draft. Owner and dispatch
    /// time are left alone.
    pub async fn update(&self, id: HabitId, draft: &HabitDraft) -> Result<Option<Habit>> {
        let Some(model) = Habits::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query habit for update")?
        else {
            return Ok(None);
        };

        let mut active: habits::ActiveModel = model.into();
        Self::apply_draft(&mut active, draft);
        active.updated_at = Set(Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update habit")?;

        Ok(Some(Habit::from(model)))
    }

    pub async fn record_dispatch(&self, id: HabitId, at: DateTime<Utc>) -> Result<()> {
        Habits::update_many()
            .col_expr(habits::Column::LastDispatchTime, Expr::value(at))
            .filter(habits::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to record habit dispatch")?;

        Ok(())
    }

    /// Deletes a habit; habits that linked to it lose the link.
    pub async fn delete(&self, id: HabitId) -> Result<bool> {
        let txn = self.conn.begin().await?;

        Habits::update_many()
            .col_expr(habits::Column::LinkedId, Expr::value(Option::<i32>::None))
            .filter(habits::Column::LinkedId.eq(id.value()))
            .exec(&txn)
            .await?;

        let result = Habits::delete_by_id(id.value()).exec(&txn).await?;
        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }
}
