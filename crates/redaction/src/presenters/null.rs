//! NullPresenter - discards frames

use contracts::{ContractError, FrameBuffer, FramePresenter};

#[derive(Debug, Default)]
pub struct NullPresenter;

impl FramePresenter for NullPresenter {
    fn name(&self) -> &str {
        "null"
    }

    async fn present(&mut self, _frame_id: u64, _frame: FrameBuffer) -> Result<(), ContractError> {
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
