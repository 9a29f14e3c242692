pub mod bill_item;
pub mod consumption_bill;
pub mod draft_bill;
pub mod draft_bill_item;
pub mod draft_reception;
pub mod draft_reception_item;
pub mod product;
pub mod reception_item;
pub mod reception_sheet;
