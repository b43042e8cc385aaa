pub mod fake_downloader;
