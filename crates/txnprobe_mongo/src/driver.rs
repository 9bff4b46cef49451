//! Probe driver over the official MongoDB driver.

use futures::FutureExt;
use mongodb::bson::{doc, to_document, Document};
use mongodb::options::{
    Acknowledgment, ClientOptions, ReadConcern, ReadPreference, SelectionCriteria,
    TransactionOptions, WriteConcern,
};
use mongodb::{Client, Collection};
use tracing::debug;
use txnprobe_core::{
    DocumentWrite, ProbeConfig, ProbeDriver, ProbeError, ProbeResult, ReadIsolation, ReadRoute,
    TxnProfile, TxnScript, WriteAck, WriteTarget,
};

/// Maps read routing to the driver's selection criteria.
pub(crate) fn selection_criteria(route: ReadRoute) -> SelectionCriteria {
    let preference = match route {
        ReadRoute::Primary => ReadPreference::Primary,
        ReadRoute::PrimaryPreferred => ReadPreference::PrimaryPreferred { options: None },
        ReadRoute::Secondary => ReadPreference::Secondary { options: None },
        ReadRoute::SecondaryPreferred => ReadPreference::SecondaryPreferred { options: None },
        ReadRoute::Nearest => ReadPreference::Nearest { options: None },
    };
    SelectionCriteria::ReadPreference(preference)
}

/// Maps read isolation to the driver's read concern.
pub(crate) fn read_concern(isolation: ReadIsolation) -> ReadConcern {
    match isolation {
        ReadIsolation::Local => ReadConcern::local(),
        ReadIsolation::Majority => ReadConcern::majority(),
        ReadIsolation::Snapshot => ReadConcern::snapshot(),
    }
}

/// Maps write durability to the driver's write concern.
pub(crate) fn write_concern(ack: WriteAck) -> WriteConcern {
    match ack {
        WriteAck::Majority => WriteConcern::majority(),
        WriteAck::Nodes(nodes) => WriteConcern::builder().w(Acknowledgment::Nodes(nodes)).build(),
    }
}

/// Builds the transaction options for a profile.
pub(crate) fn transaction_options(profile: &TxnProfile) -> TransactionOptions {
    let builder = TransactionOptions::builder()
        .selection_criteria(selection_criteria(profile.read_route))
        .read_concern(read_concern(profile.read_isolation))
        .write_concern(write_concern(profile.write_ack));
    match profile.max_commit_time {
        Some(bound) => builder.max_commit_time(bound).build(),
        None => builder.build(),
    }
}

/// A [`ProbeDriver`] bound to one MongoDB deployment.
///
/// Scripts run through the driver's session transaction executor, which
/// re-invokes the transactional callback on transient errors and retries
/// commits with unknown results, so a script survives at-least-once
/// execution without duplicating documents.
pub struct MongoDriver {
    client: Option<Client>,
    endpoint: String,
}

impl std::fmt::Debug for MongoDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoDriver")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.client.is_some())
            .finish()
    }
}

impl MongoDriver {
    /// Connects to a deployment endpoint and verifies it is reachable.
    ///
    /// An absent endpoint (deployment never started) or an unreachable one
    /// fails with [`ProbeError::Setup`] before any probe phase runs.
    pub async fn connect(endpoint: Option<&str>, config: &ProbeConfig) -> ProbeResult<Self> {
        let endpoint =
            endpoint.ok_or_else(|| ProbeError::setup("deployment exposes no endpoint"))?;

        let mut options = ClientOptions::parse(endpoint)
            .await
            .map_err(|e| ProbeError::setup(format!("invalid connection string: {e}")))?;
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.server_selection_timeout);

        let client = Client::with_options(options)
            .map_err(|e| ProbeError::setup(format!("client construction failed: {e}")))?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ProbeError::setup(format!("deployment is not reachable: {e}")))?;

        debug!(%endpoint, "client connected");
        Ok(Self {
            client: Some(client),
            endpoint: endpoint.to_string(),
        })
    }

    fn client(&self) -> ProbeResult<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| ProbeError::driver("client is closed"))
    }

    fn collection(client: &Client, target: &WriteTarget) -> Collection<Document> {
        client
            .database(&target.database)
            .collection(&target.collection)
    }

    fn body_document(write: &DocumentWrite) -> ProbeResult<Document> {
        to_document(&write.body).map_err(|e| {
            ProbeError::driver_with(format!("unsupported document body for {}", write.target), e)
        })
    }
}

impl ProbeDriver for MongoDriver {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn seed(&mut self, write: &DocumentWrite) -> ProbeResult<()> {
        let client = self.client()?;
        let body = Self::body_document(write)?;
        Self::collection(client, &write.target)
            .insert_one(body)
            .write_concern(WriteConcern::majority())
            .await
            .map_err(|e| {
                ProbeError::driver_with(format!("seed insert into {} failed", write.target), e)
            })?;
        Ok(())
    }

    async fn execute(&mut self, profile: &TxnProfile, script: &TxnScript) -> ProbeResult<String> {
        let client = self.client()?.clone();
        let writes = script
            .writes()
            .iter()
            .map(|write| {
                Ok((
                    Self::collection(&client, &write.target),
                    Self::body_document(write)?,
                ))
            })
            .collect::<ProbeResult<Vec<_>>>()?;

        let mut session = client
            .start_session()
            .await
            .map_err(|e| ProbeError::transaction_with("failed to open a client session", e))?;

        let result = session
            .start_transaction()
            .with_options(transaction_options(profile))
            .and_run(writes, |session, writes| {
                async move {
                    for (collection, body) in writes.iter() {
                        collection.insert_one(body).session(&mut *session).await?;
                    }
                    Ok(())
                }
                .boxed()
            })
            .await;

        match result {
            Ok(()) => Ok(script.receipt().to_string()),
            Err(e) => {
                let message = e.to_string();
                Err(ProbeError::transaction_with(message, e))
            }
        }
    }

    async fn committed(&mut self, target: &WriteTarget, marker: &str) -> ProbeResult<u64> {
        let client = self.client()?;
        Self::collection(client, target)
            .count_documents(doc! { "run": marker })
            .await
            .map_err(|e| ProbeError::driver_with(format!("count on {target} failed"), e))
    }

    async fn close(&mut self) -> ProbeResult<()> {
        if let Some(client) = self.client.take() {
            client.shutdown().await;
        }
        Ok(())
    }
}
