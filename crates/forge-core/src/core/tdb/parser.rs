use super::expr::{Expr, Piecewise, Segment};
use super::{Database, Element, Parameter, Phase, Species, TdbError, TdbParseErrorKind};
use phf::phf_map;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Element,
    Species,
    Function,
    Phase,
    Constituent,
    Parameter,
    Ignored,
}

static COMMANDS: phf::Map<&'static str, Command> = phf_map! {
    "ELEMENT" => Command::Element,
    "SPECIES" => Command::Species,
    "FUNCTION" => Command::Function,
    "PHASE" => Command::Phase,
    "CONSTITUENT" => Command::Constituent,
    "PARAMETER" => Command::Parameter,
    "TYPE_DEFINITION" => Command::Ignored,
    "DEFINE_SYSTEM_DEFAULT" => Command::Ignored,
    "DEFAULT_COMMAND" => Command::Ignored,
    "DATABASE_INFO" => Command::Ignored,
    "VERSION_DATE" => Command::Ignored,
    "REFERENCE_FILE" => Command::Ignored,
    "ADD_REFERENCES" => Command::Ignored,
    "LIST_OF_REFERENCES" => Command::Ignored,
    "ASSESSED_SYSTEMS" => Command::Ignored,
    "TEMPERATURE_LIMITS" => Command::Ignored,
};

fn resolve_keyword(word: &str) -> Result<Command, TdbParseErrorKind> {
    let upper = word.to_ascii_uppercase();
    if let Some(cmd) = COMMANDS.get(upper.as_str()) {
        return Ok(*cmd);
    }
    let mut matches = COMMANDS
        .entries()
        .filter(|(name, _)| name.starts_with(upper.as_str()));
    match (matches.next(), matches.next()) {
        (Some((_, cmd)), None) => Ok(*cmd),
        (Some(_), Some(_)) => Err(TdbParseErrorKind::AmbiguousCommand),
        (None, _) => Err(TdbParseErrorKind::UnknownCommand),
    }
}

/// Splits the raw file content into `!`-terminated commands, dropping `$` comment lines.
fn split_commands(content: &str) -> Vec<String> {
    let mut cleaned = String::with_capacity(content.len());
    for line in content.lines() {
        if line.trim_start().starts_with('$') {
            continue;
        }
        cleaned.push_str(line);
        cleaned.push(' ');
    }
    cleaned
        .split('!')
        .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|c| !c.is_empty())
        .collect()
}

pub(super) fn parse_database(content: &str) -> Result<Database, TdbError> {
    let mut db = Database::default();

    for (index, command) in split_commands(content).iter().enumerate() {
        let (keyword, body) = command
            .split_once(' ')
            .unwrap_or((command.as_str(), ""));
        let wrap = |kind: TdbParseErrorKind| TdbError::Parse {
            command: index + 1,
            keyword: keyword.to_string(),
            kind,
        };

        let cmd = resolve_keyword(keyword).map_err(wrap)?;
        trace!("TDB command {}: {:?}", index + 1, cmd);
        match cmd {
            Command::Element => db.elements.push(parse_element(body).map_err(wrap)?),
            Command::Species => db.species.push(parse_species(body).map_err(wrap)?),
            Command::Function => {
                let (name, function) = parse_function(body).map_err(wrap)?;
                db.symbols.insert(name, function);
            }
            Command::Phase => db.phases.push(parse_phase(body).map_err(wrap)?),
            Command::Constituent => {
                let (name, constituents) = parse_constituent(body).map_err(wrap)?;
                let phase = db
                    .phases
                    .iter_mut()
                    .find(|p| p.name == name)
                    .ok_or_else(|| wrap(TdbParseErrorKind::UndeclaredPhase(name.clone())))?;
                if phase.sublattice_count() != constituents.len() {
                    return Err(wrap(TdbParseErrorKind::SublatticeMismatch {
                        expected: phase.sublattice_count(),
                        found: constituents.len(),
                    }));
                }
                phase.constituents = constituents;
            }
            Command::Parameter => db.parameters.push(parse_parameter(body).map_err(wrap)?),
            Command::Ignored => debug!("Skipping TDB command '{}'", keyword),
        }
    }

    debug!(
        "Parsed TDB database: {} elements, {} symbols, {} phases, {} parameters",
        db.elements.len(),
        db.symbols.len(),
        db.phases.len(),
        db.parameters.len()
    );
    Ok(db)
}

fn parse_number(token: &str) -> Result<f64, TdbParseErrorKind> {
    token
        .replace(['D', 'd'], "E")
        .parse()
        .map_err(|_| TdbParseErrorKind::InvalidNumber(token.to_string()))
}

fn parse_element(body: &str) -> Result<Element, TdbParseErrorKind> {
    let fields: Vec<&str> = body.split_whitespace().collect();
    let name = fields
        .first()
        .ok_or(TdbParseErrorKind::MissingField("element name"))?;
    let reference_phase = fields
        .get(1)
        .ok_or(TdbParseErrorKind::MissingField("reference phase"))?;
    let number = |i: usize, field: &'static str| -> Result<f64, TdbParseErrorKind> {
        fields
            .get(i)
            .ok_or(TdbParseErrorKind::MissingField(field))
            .and_then(|t| parse_number(t))
    };
    Ok(Element {
        name: name.to_ascii_uppercase(),
        reference_phase: reference_phase.to_string(),
        mass: number(2, "mass")?,
        h298: number(3, "H298")?,
        s298: number(4, "S298")?,
    })
}

fn parse_species(body: &str) -> Result<Species, TdbParseErrorKind> {
    let mut fields = body.split_whitespace();
    let name = fields
        .next()
        .ok_or(TdbParseErrorKind::MissingField("species name"))?;
    let formula = fields
        .next()
        .ok_or(TdbParseErrorKind::MissingField("species formula"))?;
    Ok(Species {
        name: name.to_ascii_uppercase(),
        formula: formula.to_string(),
    })
}

fn parse_function(body: &str) -> Result<(String, Piecewise), TdbParseErrorKind> {
    let (name, rest) = body
        .split_once(' ')
        .ok_or(TdbParseErrorKind::MissingField("function body"))?;
    let (function, _) = parse_piecewise(rest)?;
    Ok((name.trim_end_matches('#').to_ascii_uppercase(), function))
}

/// Parses `T0 expr; T1 Y expr; ... Tn N [reference]`.
fn parse_piecewise(text: &str) -> Result<(Piecewise, Option<String>), TdbParseErrorKind> {
    let parts: Vec<&str> = text.split(';').collect();
    if parts.len() < 2 {
        return Err(TdbParseErrorKind::MalformedPiecewise(
            "expected at least one ';'-terminated range".to_string(),
        ));
    }

    let (lower, first_expr) = parts[0]
        .trim()
        .split_once(' ')
        .ok_or_else(|| TdbParseErrorKind::MalformedPiecewise(parts[0].trim().to_string()))?;
    let mut lower = parse_number(lower)?;
    let mut pending = Expr::parse(first_expr)?;
    let mut segments = Vec::new();
    let mut reference = None;

    for (i, part) in parts[1..].iter().enumerate() {
        let mut fields = part.trim().splitn(3, ' ');
        let upper = fields
            .next()
            .filter(|s| !s.is_empty())
            .ok_or(TdbParseErrorKind::MissingField("upper temperature limit"))?;
        let upper = parse_number(upper)?;
        let flag = fields.next().unwrap_or("N").to_ascii_uppercase();
        let remainder = fields.next().unwrap_or("").trim();

        segments.push(Segment {
            lower,
            upper,
            expr: pending,
        });

        match flag.as_str() {
            "Y" => {
                if i + 2 >= parts.len() {
                    return Err(TdbParseErrorKind::MalformedPiecewise(
                        "range continues with 'Y' but no further limit follows".to_string(),
                    ));
                }
                lower = upper;
                pending = Expr::parse(remainder)?;
            }
            "N" => {
                if !remainder.is_empty() {
                    reference = Some(remainder.to_string());
                }
                return Ok((Piecewise { segments }, reference));
            }
            other => {
                return Err(TdbParseErrorKind::MalformedPiecewise(format!(
                    "expected 'Y' or 'N' after limit, found '{}'",
                    other
                )));
            }
        }
    }

    Err(TdbParseErrorKind::MalformedPiecewise(
        "function is not terminated by 'N'".to_string(),
    ))
}

fn split_phase_name(token: &str) -> (String, String) {
    match token.split_once(':') {
        Some((name, hints)) => (name.to_ascii_uppercase(), hints.to_ascii_uppercase()),
        None => (token.to_ascii_uppercase(), String::new()),
    }
}

fn parse_phase(body: &str) -> Result<Phase, TdbParseErrorKind> {
    let fields: Vec<&str> = body.split_whitespace().collect();
    let (name, model_hints) = split_phase_name(
        fields
            .first()
            .ok_or(TdbParseErrorKind::MissingField("phase name"))?,
    );
    let count_token = fields
        .get(2)
        .ok_or(TdbParseErrorKind::MissingField("sublattice count"))?;
    let count = count_token
        .parse::<usize>()
        .map_err(|_| TdbParseErrorKind::InvalidNumber(count_token.to_string()))?;
    let site_ratios = fields
        .iter()
        .skip(3)
        .map(|t| parse_number(t))
        .collect::<Result<Vec<_>, _>>()?;
    if site_ratios.len() != count {
        return Err(TdbParseErrorKind::SublatticeMismatch {
            expected: count,
            found: site_ratios.len(),
        });
    }
    Ok(Phase {
        name,
        model_hints,
        site_ratios,
        constituents: Vec::new(),
    })
}

fn normalize_species(token: &str) -> String {
    token.trim().trim_end_matches('%').to_ascii_uppercase()
}

fn parse_constituent(body: &str) -> Result<(String, Vec<Vec<String>>), TdbParseErrorKind> {
    let (name_token, rest) = body
        .split_once(' ')
        .ok_or(TdbParseErrorKind::MissingField("constituent list"))?;
    let (name, _) = split_phase_name(name_token);
    let list = rest.trim().trim_start_matches(':').trim_end_matches(':');
    let sublattices = list
        .split(':')
        .map(|sub| {
            sub.split(',')
                .map(normalize_species)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .collect();
    Ok((name, sublattices))
}

fn parse_parameter(body: &str) -> Result<Parameter, TdbParseErrorKind> {
    let malformed = || TdbParseErrorKind::MalformedParameter(body.to_string());
    let open = body.find('(').ok_or_else(malformed)?;
    let close = body.find(')').ok_or_else(malformed)?;
    if close < open {
        return Err(malformed());
    }
    let kind = body[..open].trim().to_ascii_uppercase();
    let descriptor = &body[open + 1..close];

    let (phase_token, array) = descriptor.split_once(',').ok_or_else(malformed)?;
    let (phase, _) = split_phase_name(phase_token.trim());
    let (array, order) = match array.split_once(';') {
        Some((a, o)) => (
            a,
            o.trim()
                .parse::<u32>()
                .map_err(|_| TdbParseErrorKind::InvalidNumber(o.trim().to_string()))?,
        ),
        None => (array, 0),
    };
    let constituent_array = array
        .split(':')
        .map(|sub| sub.split(',').map(normalize_species).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    if kind.is_empty() || constituent_array.iter().flatten().any(String::is_empty) {
        return Err(malformed());
    }

    let (function, reference) = parse_piecewise(body[close + 1..].trim())?;
    Ok(Parameter {
        kind,
        phase,
        constituent_array,
        order,
        function,
        reference,
    })
}
