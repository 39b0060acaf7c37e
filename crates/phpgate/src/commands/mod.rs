pub mod pre_commit;
