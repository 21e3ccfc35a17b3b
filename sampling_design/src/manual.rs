/*!

This is the long-form manual for `sampling_design` and `sampleplan`.

## Sizing

The minimum sample is given by Cochran's formula with the finite population
correction, using the maximum variance `p = q = 0.5`:

```text
n0 = Z² p q / e²
n  = ceil(n0 N / (n0 + N - 1))
```

The Z-scores are 1.645 (90%), 1.96 (95%) and 2.576 (99%). Other confidence
levels are sized as 95%.

The recommended sample then goes through the operational stages, whose
constants live in `SamplingConfig`:

| stage            | default                                  |
|------------------|------------------------------------------|
| design effect    | `ceil(n × 1.3)`                          |
| zone floor       | 12 interviews per electoral zone         |
| municipal floor  | 400 interviews                           |
| rounding         | up to a multiple of 10                   |
| field target     | `recommended / 0.80`, rounded up to 10   |

The real margin of error of the recommended sample is reported as well. A
sample that covers the whole electorate has no sampling error.

## Scenarios

Seven standard combinations of confidence and margin are always sized, from
`Economical (90% / ±7%)` to `Maximum (99% / ±3%)`. The one equal to the
requested parameters is flagged. Scenarios stop at the rounding stage: they
carry no field target.

## Allocation

All the quota tables use the largest remainder (Hamilton) method: every
stratum receives the floor of its ideal share, and the units left over go to
the largest fractional remainders, the earliest stratum first in case of a
tie. The quotas always add up exactly to the sample.

* zones: proportional to the zone electorate, then split by gender within
  each zone (the female quota is rounded half to even, the male quota takes
  the rest)
* gender: from the zone electorate
* education and age group: from the municipal profile, when available

Profile labels are normalized (trimmed, upper case, single spaces) and mapped
by ordered substring rules:

| label contains                    | education          |
|-----------------------------------|--------------------|
| `ANALFAB`                         | Illiterate         |
| `LE E ESCREVE`, `LÊ E ESCREVE`    | Reads and writes   |
| `FUNDAMENTAL`                     | Elementary school  |
| `MEDIO`, `MÉDIO`                  | High school        |
| `SUPERIOR`                        | Higher education   |

Age brackets are recognized by any age number they contain (`16` to `24`,
`25` to `34`, `35` to `44`, `45` to `59`, then `60` and over). Labels that
match no rule are counted as unmapped: the benchmark notes report how many
electors were left out of each table.

## Command line

```text
sampleplan --zones tse.csv --population ibge.csv --profile tse_perfil.csv \
    --uf SP --municipality Campinas --out plan.json
```

Options:
* `--confidence`, `--margin`: sampling parameters (default 0.95 and 0.05)
* `--sample`: imposes the sample size (100 to 10000). It is raised to the
  Cochran minimum when needed.
* `--sizing-only`: outputs the sizing and the scenarios only
* `--methodology`: a JSON file overriding the operational constants
* `--config`: a JSON file with the same options, in camelCase
* `--list-ufs`, `--list-municipalities`: catalog of the population table
* `--reference`: compares the output with a reference JSON file
* `--input-type xlsx`: reads the tables from Excel worksheets

## Input formats

### Zones (`tse.csv`)

`UF,MUNICIPIO,ZONA,ELEITORES_TOTAL,ELEITORES_FEMININO,ELEITORES_MASCULINO,SECOES`

One line per electoral zone. Numeric zone numbers are written with 4 digits
(`33` and `0033` are the same zone), so a spreadsheet may store them as
numbers. When the female and male counts fall short of
the total, the difference is added to the female count.

### Population (`ibge.csv`)

`UF,MUNICIPIO,POPULACAO_TOTAL,IDH,ID_IBGE`

The population is optional: the electorate is used when the municipality is
missing. The human development index is only reported.

### Profile (`tse_perfil.csv`)

`UF,MUNICIPIO,DIMENSAO,CATEGORIA,QT_ELEITORES`

`DIMENSAO` is one of `GENERO`, `INSTRUCAO` or `FAIXA_ETARIA`. The gender lines
are not used: gender comes from the zones.

Municipalities are matched on the state code and the name, both trimmed and
case-insensitive.

### Methodology file

```json
{
  "designEffect": 1.3,
  "responseRate": 0.8,
  "minInterviewsPerZone": 12,
  "municipalFloor": 400,
  "roundingStep": 10
}
```

All the fields are optional.

*/
