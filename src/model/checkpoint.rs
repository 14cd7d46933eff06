use std::fs;
use std::path::Path;

use tracing::debug;

use super::TpaLstm;
use crate::constants::model::INPUT_SIZE;
use crate::error::Result;

impl TpaLstm {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(postcard::to_stdvec(self)?)
    }

    /// Decodes a model and checks every parameter against its stored config.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let model: Self = postcard::from_bytes(bytes)?;
        model.check_parameters()?;
        Ok(model)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path.as_ref(), &bytes)?;
        debug!(path = %path.as_ref().display(), bytes = bytes.len(), "saved checkpoint");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let model = Self::from_bytes(&bytes)?;
        debug!(
            path = %path.as_ref().display(),
            parameters = model.num_parameters(),
            "loaded checkpoint"
        );
        Ok(model)
    }

    fn check_parameters(&self) -> Result<()> {
        let config = &self.config;
        config.validate()?;

        let hidden = config.hidden_size;
        self.projector.linear.check("input_projector", INPUT_SIZE, hidden)?;
        self.encoder.lstm.check(hidden, hidden, config.n_layers)?;
        self.attention.check(config.filter_num, config.attn_len(), hidden)?;
        self.output.check("output_projector", hidden, config.predict_seq_len)
    }
}
