mod budget_properties;
mod gas_decisions;
mod inventory_flow;
mod scenarios;
