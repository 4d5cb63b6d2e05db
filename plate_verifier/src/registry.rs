use mongodb::bson::{doc, Document};
use mongodb::sync::{Client, Collection};

use crate::error::Result;
use crate::metrics::REGISTRY_ERRORS;

const VEHICLES_COLLECTION: &str = "vehicles";

/// Backing store of known plates. Answers by exact match on the normalized text.
pub trait PlateStore {
    fn contains(&self, plate: &str) -> Result<bool>;
}

pub struct MongoPlateStore {
    client: Client,
    vehicles: Collection<Document>,
}

impl MongoPlateStore {
    /// Connects and pings the deployment. Any failure here is fatal for the caller.
    pub fn connect(uri: &str, database: &str) -> Result<Self> {
        let store = Self::lazy(uri, database)?;
        if let Err(e) = store.ping() {
            log::error!("Failed to connect to MongoDB: {e}");
            return Err(e);
        }
        log::info!("Connected to MongoDB");
        Ok(store)
    }

    /// Builds the client without talking to the server.
    pub fn lazy(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)?;
        let vehicles = client
            .database(database)
            .collection::<Document>(VEHICLES_COLLECTION);
        Ok(Self { client, vehicles })
    }

    fn ping(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)?;
        Ok(())
    }
}

impl PlateStore for MongoPlateStore {
    fn contains(&self, plate: &str) -> Result<bool> {
        let vehicle = self.vehicles.find_one(doc! { "licensePlate": plate }, None)?;
        Ok(vehicle.is_some())
    }
}

/// Presence queries that never fail: a store error reads as "not registered".
pub struct RegistryClient {
    store: Box<dyn PlateStore>,
}

impl RegistryClient {
    pub fn new(store: Box<dyn PlateStore>) -> Self {
        Self { store }
    }

    pub fn is_registered(&self, plate: &str) -> bool {
        match self.store.contains(plate) {
            Ok(found) => found,
            Err(e) => {
                REGISTRY_ERRORS.inc();
                log::error!("Error querying database for plate {plate}: {e}");
                false
            }
        }
    }
}
