pub mod workspace_osd;
