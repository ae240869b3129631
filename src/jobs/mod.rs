pub mod ingest_job;
