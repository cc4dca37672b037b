pub mod cmp_files;
pub mod dsub_jobs;
pub mod gen_pipe;
pub mod input_pairs;
