use sea_orm::entity::prelude::*;

/// Ledger entry written by the mail ingestion job. Never updated here.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub sender_account: String,

    pub receiver_account: String,

    pub sender_name: String,

    pub sender_bank: String,

    pub transaction_type: String,

    #[sea_orm(unique)]
    pub transaction_code: String,

    pub transaction_date_time: ChronoDateTimeUtc,

    /// Amount as printed in the source mail, e.g. `+1,500,000 VND`
    pub amount_display: String,

    /// Signed amount; positive values are incoming.
    pub amount_numeric: f64,

    pub fee_display: String,

    pub fee_numeric: f64,

    pub description: String,

    pub source_email_id: Option<String>,

    pub source_history_id: Option<String>,

    pub processed_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
