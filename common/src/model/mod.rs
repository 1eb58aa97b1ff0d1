pub mod batch;
pub mod columns;
pub mod ingest;
pub mod resident;
