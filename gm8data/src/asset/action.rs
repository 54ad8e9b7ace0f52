use crate::{
    code::{CodeHandle, CodeRegistry},
    stream::{ReadPasExt, SkipExt},
    Error,
};
use byteorder::{ReadBytesExt, LE};
use std::io::{self, Seek, SeekFrom};

/// One drag-and-drop action inside an object event or timeline moment.
///
/// The executable payload lives in the parameters: expression parameters are
/// registered as questions, GML parameters as runnable blobs, and both get
/// compiled in the post-load pass. Literal parameters are kept as values.
#[derive(Debug)]
pub struct CodeAction {
    pub action_id: u32,
    pub question: bool,
    pub applies_to_something: bool,
    pub applies_to: i32,
    pub relative: bool,
    pub negate: bool,
    pub params: Vec<ActionParam>,
}

#[derive(Debug)]
pub enum ActionParam {
    Expression(CodeHandle),
    Code(CodeHandle),
    StringLiteral(String),
    IntLiteral(i32),
}

impl CodeAction {
    pub(crate) fn read(data: &mut io::Cursor<&[u8]>, code: &mut dyn CodeRegistry) -> Result<Self, Error> {
        data.seek(SeekFrom::Current(8))?; // version id, library id
        let action_id = data.read_u32::<LE>()?;
        data.seek(SeekFrom::Current(8))?; // action kind, can-be-relative flag
        let question = data.read_u32::<LE>()? != 0;
        let applies_to_something = data.read_u32::<LE>()? != 0;
        data.seek(SeekFrom::Current(4))?; // execution type
        data.skip_blob()?; // function name
        data.skip_blob()?; // function code

        let param_count = data.read_u32::<LE>()? as usize;
        if param_count > 8 {
            return Err(Error::MalformedData("action declares more than 8 parameters"))
        }

        data.seek(SeekFrom::Current(4))?; // version id
        let mut types = [0u32; 8];
        for entry in types.iter_mut() {
            *entry = data.read_u32::<LE>()?;
        }
        let applies_to = data.read_i32::<LE>()?;
        let relative = data.read_u32::<LE>()? != 0;
        data.seek(SeekFrom::Current(4))?; // yet another version id

        let mut args = Vec::with_capacity(param_count);
        for _ in 0..param_count {
            args.push(data.read_pas_blob()?);
        }
        // Unused argument slots are 1-byte "0" strings.
        data.seek(SeekFrom::Current(((8 - param_count) * 5) as i64))?;
        let negate = data.read_u32::<LE>()? != 0;

        let mut params = Vec::with_capacity(param_count);
        for (arg, kind) in args.iter().zip(types.iter()) {
            params.push(match kind {
                0 => ActionParam::Expression(code.register_question(arg)),
                1 => ActionParam::Code(code.register(arg)),
                2 => ActionParam::StringLiteral(String::from_utf8_lossy(arg).into_owned()),
                3..=14 => ActionParam::IntLiteral(parse_int(arg)),
                _ => return Err(Error::MalformedData("unknown action parameter type")),
            });
        }

        Ok(CodeAction { action_id, question, applies_to_something, applies_to, relative, negate, params })
    }

    pub(crate) fn compile(&self, code: &mut dyn CodeRegistry) -> Result<(), Error> {
        for param in &self.params {
            match param {
                ActionParam::Expression(handle) | ActionParam::Code(handle) => {
                    code.compile(*handle).map_err(Error::Compile)?
                },
                _ => (),
            }
        }
        Ok(())
    }
}

/// `atoi` semantics: optional sign, leading digits, 0 on no parse.
fn parse_int(arg: &[u8]) -> i32 {
    let mut rest = arg;
    while let Some((b, tail)) = rest.split_first() {
        if !b.is_ascii_whitespace() {
            break
        }
        rest = tail;
    }
    let sign = match rest.split_first() {
        Some((&b'-', tail)) => {
            rest = tail;
            -1i64
        },
        Some((&b'+', tail)) => {
            rest = tail;
            1
        },
        _ => 1,
    };
    let mut value = 0i64;
    for &b in rest.iter().take_while(|b| b.is_ascii_digit()) {
        value = value * 10 + i64::from(b - b'0');
        if value > i64::from(u32::max_value()) {
            break
        }
    }
    (sign * value).max(i64::from(i32::min_value())).min(i64::from(i32::max_value())) as i32
}
