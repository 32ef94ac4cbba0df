/*!
 * Remote sources of TEI transcripts and audio.
 */

pub mod nakala;

pub use nakala::{CollectionClient, CollectionPage, DataRecord, FetchReport, Fetcher, NakalaClient, RemoteFile};
