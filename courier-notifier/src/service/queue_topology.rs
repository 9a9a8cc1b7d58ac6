use amqprs::{
    channel::{
        Channel, ExchangeDeclareArguments, ExchangeType, QueueBindArguments, QueueDeclareArguments,
    },
    FieldTable, FieldValue,
};
use std::time::Duration;

///
/// Queue topology of the dispatch pipeline.
///
/// A durable work queue bound to a direct exchange under a fixed routing key,
/// plus a durable retry queue that holds messages for `retry_ttl` and then
/// dead-letters them back to the work queue on the default exchange.
///
/// Declaration is idempotent: redeclaring with identical parameters is a
/// no-op, while mismatched parameters close the channel and the worker
/// retries with a fresh one.
///
#[derive(Debug, Clone)]
pub struct QueueTopology {
    pub exchange: String,
    pub routing_key: String,
    pub queue: String,
    pub retry_queue: String,
    pub retry_ttl: Duration,
}

// AMQP short string limit
const MAX_NAME_LEN: usize = 255;

impl QueueTopology {
    pub fn new(
        exchange: String,
        routing_key: String,
        queue: String,
        retry_ttl: Duration,
    ) -> anyhow::Result<Self> {
        let retry_queue = format!("{queue}.retry");

        for name in [&exchange, &routing_key, &queue, &retry_queue] {
            anyhow::ensure!(
                name.len() <= MAX_NAME_LEN,
                "name '{name}' exceeds {MAX_NAME_LEN} bytes"
            );
        }

        Ok(Self {
            exchange,
            routing_key,
            queue,
            retry_queue,
            retry_ttl,
        })
    }

    pub async fn declare(&self, channel: &Channel) -> Result<(), amqprs::error::Error> {
        tracing::debug!(exchange = %self.exchange, "declaring exchange");
        let mut exchange_declare_args =
            ExchangeDeclareArguments::of_type(&self.exchange, ExchangeType::Direct);
        exchange_declare_args.durable = true;
        channel.exchange_declare(exchange_declare_args).await?;

        tracing::debug!(queue = %self.queue, "declaring work queue");
        let queue_declare_args = QueueDeclareArguments::new(&self.queue).durable(true).finish();
        channel.queue_declare(queue_declare_args).await?;

        tracing::debug!(queue = %self.queue, "binding work queue");
        let queue_bind_args = QueueBindArguments::new(&self.queue, &self.exchange, &self.routing_key);
        channel.queue_bind(queue_bind_args).await?;

        tracing::debug!(queue = %self.retry_queue, "declaring retry queue");
        let mut arguments = FieldTable::new();
        arguments.insert(
            // names are length checked in new(), literals are short
            "x-dead-letter-exchange".to_string().try_into().unwrap(),
            FieldValue::S("".to_string().try_into().unwrap()),
        );
        arguments.insert(
            "x-dead-letter-routing-key".to_string().try_into().unwrap(),
            FieldValue::S(self.queue.clone().try_into().unwrap()),
        );
        arguments.insert(
            "x-message-ttl".to_string().try_into().unwrap(),
            FieldValue::l(self.retry_ttl.as_millis() as i64),
        );
        let retry_queue_declare_args = QueueDeclareArguments::new(&self.retry_queue)
            .durable(true)
            .arguments(arguments)
            .finish();
        channel.queue_declare(retry_queue_declare_args).await?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn retry_queue_name_derived_from_work_queue() {
        let topology = QueueTopology::new(
            "notifications".to_string(),
            "notifications".to_string(),
            "notifications_queue".to_string(),
            Duration::from_millis(10_000),
        )
        .unwrap();

        assert_eq!(topology.retry_queue, "notifications_queue.retry");
    }

    #[test]
    fn queue_name_over_short_string_limit_rejected() {
        let result = QueueTopology::new(
            "notifications".to_string(),
            "notifications".to_string(),
            "q".repeat(MAX_NAME_LEN + 1),
            Duration::from_millis(10_000),
        );

        assert!(result.is_err());
    }

    #[test]
    fn queue_name_whose_retry_queue_exceeds_short_string_limit_rejected() {
        let result = QueueTopology::new(
            "notifications".to_string(),
            "notifications".to_string(),
            "q".repeat(MAX_NAME_LEN),
            Duration::from_millis(10_000),
        );

        assert!(result.is_err());
    }
}
