//! The diagnostic run: prompts, group resolution, then one member scan per group.

use core::cell::{Cell, RefCell};
use std::io::{self, BufRead, Write};

use tracing::{error, info, instrument};

use crate::config::ScanConfig;
use crate::directory::{DirectoryError, DirectorySearcher};
use crate::error::{Error, Result};
use crate::resolver::GroupResolver;
use crate::scanner::{GroupMemberScanner, member_search};

/// Counts of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Groups whose members were scanned.
    pub groups: usize,
    /// Members scanned over all groups.
    pub members: usize,
    /// Findings reported over all groups.
    pub findings: usize,
}

/// Writes `prompt`, then reads lines until one is not empty, writing
/// `retry` after each empty one. The line terminator is stripped.
///
/// # Errors
/// I/O errors, and [`io::ErrorKind::UnexpectedEof`] if input ends first.
#[inline]
pub fn prompt_non_empty<R, W>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    retry: &str,
) -> io::Result<String>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    writeln!(output, "{prompt}")?;
    output.flush()?;
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input ended before a value was given",
            ));
        }
        let value = line.trim_end_matches(['\r', '\n']);
        if !value.is_empty() {
            return Ok(value.to_owned());
        }
        writeln!(output, "{retry}")?;
        output.flush()?;
    }
}

fn value_or_prompt<R, W>(
    given: Option<&str>,
    input: &mut R,
    output: &mut W,
    prompt: &str,
    retry: &str,
) -> io::Result<String>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    match given.filter(|value| !value.is_empty()) {
        Some(value) => Ok(value.to_owned()),
        None => prompt_non_empty(input, output, prompt, retry),
    }
}

/// Runs the whole diagnostic against `searcher`.
///
/// Domain and group come from `config` or are prompted for on
/// `input`/`output`. Report lines go to `output`.
///
/// # Errors
/// - [`Error::NoGroupMatch`] when no group is accepted,
/// - [`Error::Directory`] when the group search fails,
/// - [`Error::Io`] when the console fails.
///
/// A member search failing only ends the scan of that group.
#[inline]
pub fn run<S, R, W>(
    searcher: &S,
    config: &ScanConfig,
    input: &mut R,
    output: &mut W,
) -> Result<RunSummary>
where
    S: DirectorySearcher + ?Sized,
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    let domain = value_or_prompt(
        config.domain.as_deref(),
        input,
        output,
        "Please provide the target domain name:",
        "Please provide a valid domain name.",
    )?;
    let group = value_or_prompt(
        config.group.as_deref(),
        input,
        output,
        "Please provide the target group name that you want to search for invalid characters:",
        "Please provide a valid group name.",
    )?;

    let matched = RefCell::new(Vec::new());
    let groups = GroupResolver::new()
        .with_page_size(config.page_size)
        .with_timeout(config.search_timeout())
        .on_match(|path| matched.borrow_mut().push(path.to_owned()))
        .resolve_groups(searcher, &domain, &group)?;
    for path in matched.into_inner() {
        writeln!(output, "Found matching group: {path} in domain: {domain}.")?;
    }
    if groups.is_empty() {
        return Err(Error::NoGroupMatch { domain, group });
    }

    let mut summary = RunSummary::default();
    for (&rid, path) in &groups {
        let (members, findings) = scan_group(searcher, config, rid, path, output)?;
        summary.groups += 1;
        summary.members += members;
        summary.findings += findings;
    }
    info!(
        groups = summary.groups,
        members = summary.members,
        findings = summary.findings,
        "scan complete"
    );
    Ok(summary)
}

/// Scans the members of one group, returning members scanned and findings.
#[instrument(level = "info", skip(searcher, config, output))]
fn scan_group<S, W>(
    searcher: &S,
    config: &ScanConfig,
    rid: u32,
    path: &str,
    output: &mut W,
) -> io::Result<(usize, usize)>
where
    S: DirectorySearcher + ?Sized,
    W: Write + ?Sized,
{
    writeln!(output, "Finding invalid characters in group: {path}.")?;

    let results = match searcher.find_all(&member_search(rid, config.page_size)) {
        Ok(results) => results,
        Err(err) => {
            error!(%err, "member search failed, skipping group");
            return Ok((0, 0));
        }
    };

    let mut page_error: Option<DirectoryError> = None;
    let records = results.map_while(|entry| match entry {
        Ok(entry) => Some(entry),
        Err(err) => {
            page_error = Some(err);
            None
        }
    });

    // Progress lines are written from inside the scan, as marks are crossed.
    let out = RefCell::new(output);
    let progress_error = Cell::new(None);
    let mut scan = GroupMemberScanner::new()
        .with_progress_interval(config.progress_interval())
        .on_progress(|scanned| {
            if let Err(err) = writeln!(out.borrow_mut(), "Scanned {scanned} users.") {
                progress_error.set(Some(err));
            }
        })
        .scan(records);
    let mut findings = 0;
    loop {
        let next = scan.next();
        if let Some(err) = progress_error.take() {
            return Err(err);
        }
        let Some(finding) = next else { break };
        writeln!(out.borrow_mut(), "{finding}")?;
        findings += 1;
    }
    let members = scan.scanned();
    drop(scan);

    if let Some(err) = page_error {
        error!(%err, members, "member search failed mid-scan, group results are partial");
    }
    Ok((members, findings))
}
