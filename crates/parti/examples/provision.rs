use chrono::{Local, NaiveDateTime};
use parti::db::{Config, SeaOrmExecutor, connect};
use parti::log::LogConfig;
use parti::{EntitySchema, PartitionOptions, PartitionedEntity, Provisioner};

struct Event {
    schema: EntitySchema,
    created_at: NaiveDateTime,
}

impl PartitionedEntity for Event {
    fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    fn partition_value(&self) -> Option<NaiveDateTime> {
        Some(self.created_at)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    parti::log::init(&LogConfig::default())?;

    let conn = connect(Config { database_url: std::env::var("DATABASE_URL")?, ..Default::default() }).await?;
    let exec = SeaOrmExecutor::new(&conn);
    let provisioner = Provisioner::new(exec.backend());

    let schema = EntitySchema {
        name: "Event".to_string(),
        table: "events".to_string(),
        primary_key: vec!["id".to_string()],
        columns: vec!["id".to_string(), "created_at".to_string()],
        options: PartitionOptions {
            partition_type: "range".to_string(),
            partition_range: "month".to_string(),
            partition_subtype: "date".to_string(),
            partition_column: "created_at".to_string(),
        },
    };
    provisioner.prepare(&exec, &schema).await?;

    let event = Event { schema, created_at: Local::now().naive_local() };
    provisioner
        .ensure_partition_then_write(&exec, &event, |provisioned| async move {
            println!("insert into {}", provisioned.descriptor.partition_name());
            Ok::<_, anyhow::Error>(())
        })
        .await
}
