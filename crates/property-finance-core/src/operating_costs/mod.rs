pub mod cost_growth;
