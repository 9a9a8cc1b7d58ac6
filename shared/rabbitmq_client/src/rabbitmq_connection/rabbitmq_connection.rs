use super::{dto::RabbitmqConnectionConfig, rabbitmq_connection_callback::RabbitmqConnectionCallback};
use crate::retry::retry;
use amqprs::connection::{Connection, OpenConnectionArguments};
use std::sync::Arc;
use tokio::{
    sync::{watch, Notify},
    task::JoinHandle,
};

///
/// RabbitMQ connection with a keep alive task that recreates
/// the connection whenever a network io failure occurs.
///
/// Current connection can be observed through [Self::connection];
/// the watched value is [None] while the connection is being recreated.
///
#[derive(Clone)]
pub struct RabbitmqConnection {
    inner: Arc<RabbitmqConnectionInner>,
}

struct RabbitmqConnectionInner {
    config: RabbitmqConnectionConfig,

    connection_rx: watch::Receiver<Option<Connection>>,

    keep_alive_handle: JoinHandle<()>,
    close_notify: Arc<Notify>,
}

impl RabbitmqConnection {
    #[tracing::instrument(
        name = "RabbitMQ Connection",
        target = "rabbitmq_client::connection",
        skip_all
    )]
    pub async fn new(
        config: RabbitmqConnectionConfig,
        open_connection_args: OpenConnectionArguments,
    ) -> Result<Self, amqprs::error::Error> {
        tracing::info!("opening connection");
        let connection = Connection::open(&open_connection_args).await?;

        tracing::info!("registering callback");
        let callback = RabbitmqConnectionCallback;
        connection.register_callback(callback.clone()).await?;

        tracing::info!("starting keep alive task");
        let close_notify = Arc::new(Notify::new());
        let (connection_tx, connection_rx) = watch::channel(Some(connection.clone()));
        let keep_alive_handle = tokio::spawn(keep_alive(
            Arc::clone(&close_notify),
            config.clone(),
            connection,
            connection_tx,
            open_connection_args,
            callback,
        ));

        tracing::info!("connection opened");

        Ok(Self {
            inner: Arc::new(RabbitmqConnectionInner {
                config,
                connection_rx,
                keep_alive_handle,
                close_notify,
            }),
        })
    }

    ///
    /// Close underlying connection and the task that recreates it.
    ///
    /// ### Errors
    /// Returns an error when it is not the last clone of the connection
    ///
    #[tracing::instrument(
        name = "RabbitMQ Connection",
        target = "rabbitmq_client::connection",
        skip_all
    )]
    pub async fn close(self) -> anyhow::Result<()> {
        let Ok(inner) = Arc::try_unwrap(self.inner) else {
            anyhow::bail!("closing connection when connection clones exist is forbidden");
        };

        tracing::info!("closing keep alive task");
        inner.close_notify.notify_one();
        inner.keep_alive_handle.await.unwrap(); // task can't be aborted and will never panic
        tracing::info!("closed keep alive task");

        tracing::info!("closing connection");
        match inner.connection_rx.borrow().clone() {
            Some(connection) => match connection.close().await {
                Ok(()) => tracing::info!("connection closed"),
                Err(err) => tracing::warn!(%err, "closing connection failed"),
            },
            None => tracing::info!("connection already closed"),
        }

        Ok(())
    }

    pub fn config(&self) -> &RabbitmqConnectionConfig {
        &self.inner.config
    }

    pub fn connection(&self) -> watch::Receiver<Option<Connection>> {
        self.inner.connection_rx.clone()
    }
}

#[tracing::instrument(
    name = "RabbitMQ Connection",
    target = "rabbitmq_client::connection",
    skip_all
)]
async fn keep_alive(
    close_notify: Arc<Notify>,
    config: RabbitmqConnectionConfig,
    connection: Connection,
    connection_tx: watch::Sender<Option<Connection>>,
    open_connection_args: OpenConnectionArguments,
    callback: RabbitmqConnectionCallback,
) {
    tracing::info!("keep alive started");

    tokio::select! {
        biased;

        _ = close_notify.notified() => {}
        _ = monitor(config, connection, connection_tx, open_connection_args, callback) => {}
    }

    tracing::info!("keep alive finished");
}

async fn monitor(
    config: RabbitmqConnectionConfig,
    mut connection: Connection,
    connection_tx: watch::Sender<Option<Connection>>,
    open_connection_args: OpenConnectionArguments,
    callback: RabbitmqConnectionCallback,
) {
    loop {
        connection.listen_network_io_failure().await;
        tracing::warn!("connection broken");

        connection_tx.send_replace(None);

        connection = retry(
            config.retry_interval,
            |attempt| tracing::info!(attempt, "recreating connection"),
            |attempt, err: amqprs::error::Error| {
                tracing::warn!(attempt, %err, "failed to recreate connection")
            },
            || async {
                let connection = Connection::open(&open_connection_args).await?;
                connection.register_callback(callback.clone()).await?;
                Ok(connection)
            },
        )
        .await;
        tracing::info!("connection recreated");

        // Publishing the connection is delayed until the callback
        // is registered so observers never see a half-initialized one
        connection_tx.send_replace(Some(connection.clone()));
    }
}
