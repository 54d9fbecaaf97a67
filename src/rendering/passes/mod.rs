pub mod forward_pass;
