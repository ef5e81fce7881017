pub mod decimal_input;
